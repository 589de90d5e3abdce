//! # georaster core
//!
//! Georeferenced raster arrays and the algebra around them.
//!
//! This crate provides:
//! - `RasterArray<T>`: a 2D grid carrying its transform, CRS and no-data policy
//! - `GeoTransform`: affine pixel-to-world mapping
//! - `NoData<T>`: explicit no-data policy with kind-aware masks
//! - Elementwise algebra with no-data propagation (`ops`)
//! - Geometry windows and masks (`features`)
//! - Collaborator contracts for rasterization and reprojection

pub mod crs;
pub mod error;
pub mod features;
mod maybe_rayon;
pub mod ops;
pub mod raster;
pub mod warp;

pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{AnyRaster, Bounds, DataType, GeoTransform, MaskOptions, NoData, RasterArray, RasterElement, Window};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::features::{GeometryMaskOptions, Rasterize};
    pub use crate::ops::{BinaryOp, Dispatch, Operand, ReduceOp, UnaryOp};
    pub use crate::raster::{
        AnyRaster, Bounds, DataType, GeoTransform, MaskOptions, NoData, RasterArray, RasterElement,
        Window,
    };
    pub use crate::warp::{Reproject, Resampling};
}
