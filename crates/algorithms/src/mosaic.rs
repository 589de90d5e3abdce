//! Raster mosaicking
//!
//! Combines aligned rasters sharing CRS, element kind, no-data value and
//! resolution into one raster covering the union of their extents.

use georaster_core::crs::same_crs;
use georaster_core::raster::Bounds;
use georaster_core::{dispatch_datatype, AnyRaster, Error, GeoTransform, NoData, RasterArray, RasterElement, Result};
use ndarray::{s, Array2, ArrayView2, ArrayViewMut2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How overlapping valid pixels are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Keep the first valid value written
    #[default]
    First,
    /// Overwrite with the latest valid value
    Last,
    Min,
    Max,
    Sum,
    /// Number of valid inputs per cell
    Count,
}

impl MergeMethod {
    pub const ALL: [MergeMethod; 6] = [
        MergeMethod::First,
        MergeMethod::Last,
        MergeMethod::Min,
        MergeMethod::Max,
        MergeMethod::Sum,
        MergeMethod::Count,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MergeMethod::First => "first",
            MergeMethod::Last => "last",
            MergeMethod::Min => "min",
            MergeMethod::Max => "max",
            MergeMethod::Sum => "sum",
            MergeMethod::Count => "count",
        }
    }

    /// Combine `src` into `dst`. Masks are `true` where a cell is no-data.
    fn apply<T: RasterElement>(
        &self,
        dst: ArrayViewMut2<'_, T>,
        src: ArrayView2<'_, T>,
        dst_mask: &Array2<bool>,
        src_mask: &Array2<bool>,
    ) {
        let method = *self;
        Zip::from(dst)
            .and(&src)
            .and(dst_mask)
            .and(src_mask)
            .for_each(|d, &v, &d_nd, &s_nd| {
                if s_nd {
                    return;
                }
                *d = match (method, d_nd) {
                    (MergeMethod::Count, true) => T::one(),
                    (MergeMethod::Count, false) => d.elem_add(T::one()),
                    (_, true) | (MergeMethod::Last, false) => v,
                    (MergeMethod::First, false) => *d,
                    (MergeMethod::Min, false) => {
                        if v < *d {
                            v
                        } else {
                            *d
                        }
                    }
                    (MergeMethod::Max, false) => {
                        if v > *d {
                            v
                        } else {
                            *d
                        }
                    }
                    (MergeMethod::Sum, false) => d.elem_add(v),
                };
            });
    }
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MergeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        MergeMethod::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| Error::Unsupported(format!("unknown merge method '{}'", s)))
    }
}

/// Fail with `Incompatibility` naming the first raster that disagrees
/// with the first one on CRS, no-data value or resolution.
fn validate<T: RasterElement>(rasters: &[&RasterArray<T>]) -> Result<()> {
    let first = rasters[0];
    for (index, raster) in rasters.iter().enumerate().skip(1) {
        if !same_crs(first.crs(), raster.crs()) {
            return Err(Error::Incompatibility { property: "crs", index });
        }
        if !first.no_data().equals(&raster.no_data()) {
            return Err(Error::Incompatibility {
                property: "no_data_value",
                index,
            });
        }
        if first.x_resolution() != raster.x_resolution() {
            return Err(Error::Incompatibility {
                property: "x_resolution",
                index,
            });
        }
        if first.y_resolution() != raster.y_resolution() {
            return Err(Error::Incompatibility {
                property: "y_resolution",
                index,
            });
        }
    }
    Ok(())
}

fn merge_refs<T: RasterElement>(rasters: &[&RasterArray<T>], method: MergeMethod) -> Result<RasterArray<T>> {
    if rasters.is_empty() {
        return Err(Error::EmptyInput);
    }
    validate(rasters)?;

    let first = rasters[0];
    let (x_res, y_res) = first.resolution();
    let extent = rasters
        .iter()
        .map(|r| r.bounds())
        .reduce(|a, b| a.union(&b))
        .ok_or(Error::EmptyInput)?;

    let width = (extent.width() / x_res).round() as usize;
    let height = (extent.height() / y_res).round() as usize;

    let no_data = match first.no_data() {
        NoData::Unset => NoData::Value(T::default_nodata()),
        set => set,
    };
    let sentinel = no_data.value().unwrap_or_else(T::default_nodata);
    debug!(rasters = rasters.len(), width, height, %method, "merging rasters");

    let mut dest = Array2::from_elem((height, width), sentinel);
    // Without a shared sentinel, valid cells may hold the default one,
    // so emptiness is tracked by coverage instead of by value.
    let mut written = first
        .no_data()
        .value()
        .is_none()
        .then(|| Array2::from_elem((height, width), false));
    for raster in rasters {
        let (row_off, col_off) = offset(&extent, raster, (x_res, y_res), (height, width));
        let row_end = (row_off + raster.height()).min(height);
        let col_end = (col_off + raster.width()).min(width);
        let (rows, cols) = (row_end - row_off, col_end - col_off);
        if rows == 0 || cols == 0 {
            continue;
        }

        let source = raster.data();
        let source = source.slice(s![..rows, ..cols]);
        let source_mask = raster.no_data().mask(source);

        let mut region = dest.slice_mut(s![row_off..row_end, col_off..col_end]);
        let dest_mask = match &written {
            Some(covered) => covered
                .slice(s![row_off..row_end, col_off..col_end])
                .mapv(|c| !c),
            None => no_data.mask_close(region.view()),
        };
        method.apply(region.view_mut(), source, &dest_mask, &source_mask);

        if let Some(covered) = written.as_mut() {
            Zip::from(covered.slice_mut(s![row_off..row_end, col_off..col_end]))
                .and(&source_mask)
                .for_each(|c, &nd| *c |= !nd);
        }
    }

    let transform = GeoTransform::new(extent.x_min, extent.y_max, x_res, -y_res);
    Ok(RasterArray::new(dest, transform, first.crs().cloned(), no_data))
}

/// Pixel offset of `raster` in the output grid, clamped to it
fn offset<T: RasterElement>(
    extent: &Bounds,
    raster: &RasterArray<T>,
    (x_res, y_res): (f64, f64),
    (height, width): (usize, usize),
) -> (usize, usize) {
    let row_off = ((extent.y_max - raster.y_max()) / y_res).round().max(0.0) as usize;
    let col_off = ((raster.x_min() - extent.x_min) / x_res).round().max(0.0) as usize;
    (row_off.min(height), col_off.min(width))
}

/// Merge rasters of one element kind into a single raster.
///
/// The output covers the union of all extents at the shared resolution,
/// starts out as no-data, and receives each input in order through
/// `method`. Inputs are expected to sit on a common pixel grid.
pub fn merge<T: RasterElement>(rasters: &[RasterArray<T>], method: MergeMethod) -> Result<RasterArray<T>> {
    let refs: Vec<&RasterArray<T>> = rasters.iter().collect();
    merge_refs(&refs, method)
}

/// [`merge`] for rasters whose element kind is only known at runtime.
///
/// Mixed element kinds fail with `Incompatibility` on `dtype`.
pub fn merge_any(rasters: &[AnyRaster], method: MergeMethod) -> Result<AnyRaster> {
    let first = rasters.first().ok_or(Error::EmptyInput)?;
    let dtype = first.dtype();
    if let Some(index) = rasters.iter().position(|r| r.dtype() != dtype) {
        return Err(Error::Incompatibility { property: "dtype", index });
    }

    dispatch_datatype!(dtype, T, {
        let typed: Vec<&RasterArray<T>> = rasters.iter().filter_map(|r| r.as_typed::<T>()).collect();
        merge_refs(&typed, method).map(AnyRaster::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use georaster_core::Crs;
    use ndarray::array;

    fn tile(values: Array2<i32>, x: f64, y: f64) -> RasterArray<i32> {
        RasterArray::new(
            values,
            GeoTransform::new(x, y, 1.0, -1.0),
            Some(Crs::from_epsg(32633)),
            NoData::Value(-1),
        )
    }

    #[test]
    fn test_method_names() {
        for m in MergeMethod::ALL {
            assert_eq!(m.to_string().parse::<MergeMethod>().unwrap(), m);
        }
        assert!("mean".parse::<MergeMethod>().is_err());
    }

    #[test]
    fn test_adjacent_tiles() {
        let left = tile(array![[1, 2], [3, 4]], 0.0, 2.0);
        let right = tile(array![[5, 6], [7, 8]], 2.0, 2.0);
        let merged = merge(&[left, right], MergeMethod::First).unwrap();
        assert_eq!(merged.to_array(), array![[1, 2, 5, 6], [3, 4, 7, 8]]);
        assert_eq!(merged.no_data(), NoData::Value(-1));
        assert_eq!(merged.transform(), &GeoTransform::new(0.0, 2.0, 1.0, -1.0));
    }

    #[test]
    fn test_gap_stays_no_data() {
        let a = tile(array![[1]], 0.0, 2.0);
        let b = tile(array![[2]], 1.0, 1.0);
        let merged = merge(&[a, b], MergeMethod::First).unwrap();
        assert_eq!(merged.to_array(), array![[1, -1], [-1, 2]]);
    }

    #[test]
    fn test_overlap_methods() {
        let a = tile(array![[1, -1], [5, 5]], 0.0, 2.0);
        let b = tile(array![[3, 4], [-1, 2]], 0.0, 2.0);
        let run = |m| merge(&[a.clone(), b.clone()], m).unwrap().to_array();

        assert_eq!(run(MergeMethod::First), array![[1, 4], [5, 5]]);
        assert_eq!(run(MergeMethod::Last), array![[3, 4], [5, 2]]);
        assert_eq!(run(MergeMethod::Min), array![[1, 4], [5, 2]]);
        assert_eq!(run(MergeMethod::Max), array![[3, 4], [5, 5]]);
        assert_eq!(run(MergeMethod::Sum), array![[4, 4], [5, 7]]);
        assert_eq!(run(MergeMethod::Count), array![[2, 1], [1, 2]]);
    }

    #[test]
    fn test_incompatibility_names_property_and_index() {
        let a = tile(array![[1]], 0.0, 1.0);
        let b = tile(array![[1]], 1.0, 1.0);
        let c = RasterArray::new(array![[1]], GeoTransform::new(2.0, 1.0, 2.0, -2.0), a.crs().cloned(), NoData::Value(-1));
        let err = merge(&[a.clone(), b.clone(), c], MergeMethod::First).unwrap_err();
        assert!(matches!(err, Error::Incompatibility { property: "x_resolution", index: 2 }));

        let d = b.unset_no_data_value();
        let err = merge(&[a.clone(), d], MergeMethod::First).unwrap_err();
        assert!(matches!(err, Error::Incompatibility { property: "no_data_value", index: 1 }));

        let e = RasterArray::new(array![[1]], *b.transform(), None, NoData::Value(-1));
        let err = merge(&[a, e], MergeMethod::First).unwrap_err();
        assert!(matches!(err, Error::Incompatibility { property: "crs", index: 1 }));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(merge::<f32>(&[], MergeMethod::Sum), Err(Error::EmptyInput)));
        assert!(matches!(merge_any(&[], MergeMethod::Sum), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_merge_any_checks_dtype() {
        let a: AnyRaster = tile(array![[1]], 0.0, 1.0).into();
        let b: AnyRaster = tile(array![[2]], 1.0, 1.0).astype::<f32>().unwrap().into();
        let err = merge_any(&[a.clone(), b], MergeMethod::First).unwrap_err();
        assert!(matches!(err, Error::Incompatibility { property: "dtype", index: 1 }));

        let c: AnyRaster = tile(array![[2]], 1.0, 1.0).into();
        let merged = merge_any(&[a, c], MergeMethod::First).unwrap();
        assert_eq!(merged.as_typed::<i32>().unwrap().to_array(), array![[1, 2]]);
    }

    #[test]
    fn test_nan_no_data() {
        let a = RasterArray::new(array![[f64::NAN, 1.0]], GeoTransform::new(0.0, 1.0, 1.0, -1.0), None, NoData::Value(f64::NAN));
        let b = RasterArray::new(array![[2.0, f64::NAN]], GeoTransform::new(0.0, 1.0, 1.0, -1.0), None, NoData::Value(f64::NAN));
        let merged = merge(&[a, b], MergeMethod::First).unwrap();
        assert_eq!(merged.to_array(), array![[2.0, 1.0]]);
    }

    #[test]
    fn test_unset_no_data_uses_kind_default() {
        let a = RasterArray::new(array![[1u8]], GeoTransform::new(0.0, 1.0, 1.0, -1.0), None, NoData::Unset);
        let b = RasterArray::new(array![[2u8]], GeoTransform::new(2.0, 1.0, 1.0, -1.0), None, NoData::Unset);
        let merged = merge(&[a, b], MergeMethod::First).unwrap();
        assert_eq!(merged.no_data(), NoData::Value(u8::MIN));
        assert_eq!(merged.to_array(), array![[1, 0, 2]]);
    }

    #[test]
    fn test_unset_no_data_keeps_valid_default_values() {
        let a = RasterArray::new(array![[0u8, 3]], GeoTransform::new(0.0, 1.0, 1.0, -1.0), None, NoData::Unset);
        let b = RasterArray::new(array![[7u8, 9]], GeoTransform::new(0.0, 1.0, 1.0, -1.0), None, NoData::Unset);
        let first = merge(&[a.clone(), b.clone()], MergeMethod::First).unwrap();
        assert_eq!(first.to_array(), array![[0, 3]]);

        let min = merge(&[b, a], MergeMethod::Min).unwrap();
        assert_eq!(min.to_array(), array![[0, 3]]);
    }

    #[test]
    fn test_near_sentinel_destination_counts_as_no_data() {
        let grid = GeoTransform::new(0.0, 1.0, 1.0, -1.0);
        let a = RasterArray::new(array![[-9998.99, 1.0]], grid, None, NoData::Value(-9999.0));
        let b = RasterArray::new(array![[5.0, 6.0]], grid, None, NoData::Value(-9999.0));
        let merged = merge(&[a, b], MergeMethod::First).unwrap();
        assert_eq!(merged.to_array(), array![[5.0, 1.0]]);
    }
}
