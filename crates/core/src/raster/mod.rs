//! Raster data structures and operations

mod any;
mod array;
mod element;
mod geotransform;
mod nodata;
pub(crate) mod window;

pub use any::AnyRaster;
pub use array::{MaskOptions, RasterArray};
pub use element::{DataType, RasterElement};
pub use geotransform::{Bounds, GeoTransform};
pub use nodata::NoData;
pub use window::Window;

pub(crate) use nodata::cast_value;
