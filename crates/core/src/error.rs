//! Error types for georaster

use thiserror::Error;

/// Main error type for raster operations
#[derive(Error, Debug)]
pub enum Error {
    /// The raster is not in the state the operation requires
    /// (CRS already set, CRS missing, ...).
    #[error("Invalid raster state: {0}")]
    InvalidState(String),

    /// Operands of an elementwise operation disagree on georeferencing.
    #[error("Incompatible operands: {property} differs ({detail})")]
    IncompatibleOperands {
        property: &'static str,
        detail: String,
    },

    /// A raster handed to a merge disagrees with the first raster.
    #[error("All rasters must have the same {property}: raster {index} differs")]
    Incompatibility { property: &'static str, index: usize },

    /// Mutually exclusive or incomplete options.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Requested method or mode is not implemented.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Degenerate transform: determinant {determinant} is zero")]
    DegenerateTransform { determinant: f64 },

    #[error("Cannot cast {value} to {dtype}")]
    InvalidCast { value: String, dtype: &'static str },

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("No rasters given")]
    EmptyInput,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for raster operations
pub type Result<T> = std::result::Result<T, Error>;
