//! # georaster algorithms
//!
//! Operations built on top of `georaster-core`.
//!
//! - **mosaic**: merge aligned rasters into one (`first`, `last`, `min`, `max`, `sum`, `count`)
//! - **rasterize**: `GeoRasterizer`, burns `geo` geometries into boolean grids
//! - **resample**: `GridResampler`, nearest / bilinear warps between grids
//! - **projection**: WGS84 / UTM point projection used by the resampler

mod maybe_rayon;
pub mod mosaic;
pub mod projection;
pub mod rasterize;
pub mod resample;

pub use mosaic::{merge, merge_any, MergeMethod};
pub use rasterize::GeoRasterizer;
pub use resample::GridResampler;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::mosaic::{merge, merge_any, MergeMethod};
    pub use crate::rasterize::GeoRasterizer;
    pub use crate::resample::GridResampler;
    pub use georaster_core::prelude::*;
}
