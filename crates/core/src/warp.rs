//! Reprojection / resampling contract
//!
//! Rasters never interpolate themselves. They describe the source grid
//! and the wanted destination grid, and hand both to a [`Reproject`]
//! implementation which owns the kernel math.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, NoData, RasterElement};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resampling kernels a reprojection collaborator may be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
    Max,
    Min,
    Med,
    Q1,
    Q3,
    Sum,
    Rms,
}

impl Resampling {
    pub const ALL: [Resampling; 14] = [
        Resampling::Nearest,
        Resampling::Bilinear,
        Resampling::Cubic,
        Resampling::CubicSpline,
        Resampling::Lanczos,
        Resampling::Average,
        Resampling::Mode,
        Resampling::Max,
        Resampling::Min,
        Resampling::Med,
        Resampling::Q1,
        Resampling::Q3,
        Resampling::Sum,
        Resampling::Rms,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resampling::Nearest => "nearest",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::CubicSpline => "cubic_spline",
            Resampling::Lanczos => "lanczos",
            Resampling::Average => "average",
            Resampling::Mode => "mode",
            Resampling::Max => "max",
            Resampling::Min => "min",
            Resampling::Med => "med",
            Resampling::Q1 => "q1",
            Resampling::Q3 => "q3",
            Resampling::Sum => "sum",
            Resampling::Rms => "rms",
        }
    }
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resampling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Resampling::ALL
            .iter()
            .copied()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| Error::Unsupported(format!("unknown resampling method '{}'", s)))
    }
}

/// Source side of a reprojection request, borrowed from a raster.
#[derive(Debug, Clone)]
pub struct SourceGrid<'a, T> {
    pub data: ArrayView2<'a, T>,
    pub transform: GeoTransform,
    pub crs: Option<&'a Crs>,
    pub no_data: NoData<T>,
}

/// External resampling primitive.
pub trait Reproject {
    /// Reproject `source` into `dst_crs`, letting the implementation pick
    /// the destination grid. Returns the new buffer and its transform.
    fn reproject<T: RasterElement>(
        &self,
        source: &SourceGrid<'_, T>,
        dst_crs: &Crs,
        resampling: Resampling,
    ) -> Result<(Array2<T>, GeoTransform)>;

    /// Resample `source` onto an explicit destination grid, writing into
    /// `destination` in place. Cells the source does not cover keep their
    /// prior value. `dst_crs` of `None` means "same as source".
    fn reproject_into<T: RasterElement>(
        &self,
        source: &SourceGrid<'_, T>,
        destination: &mut Array2<T>,
        dst_transform: &GeoTransform,
        dst_crs: Option<&Crs>,
        resampling: Resampling,
    ) -> Result<()>;
}
