//! Grid resampling
//!
//! Backward-mapping warp: every destination pixel centre is taken to world
//! coordinates, projected into the source CRS when the two differ, then
//! sampled from the source grid.

use crate::maybe_rayon::*;
use crate::projection::{transform_point, Projection};
use georaster_core::crs::same_crs;
use georaster_core::warp::{Reproject, Resampling, SourceGrid};
use georaster_core::{Crs, Error, GeoTransform, RasterElement, Result};
use ndarray::Array2;
use tracing::debug;

/// Reference [`Reproject`] implementation.
///
/// Supports nearest-neighbour and bilinear kernels, and CRS changes
/// between WGS84 and UTM zones (see [`Projection`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct GridResampler;

impl GridResampler {
    pub fn new() -> Self {
        Self
    }

    fn check_method(resampling: Resampling) -> Result<()> {
        match resampling {
            Resampling::Nearest | Resampling::Bilinear => Ok(()),
            other => Err(Error::Unsupported(format!("'{}' resampling", other))),
        }
    }
}

/// How destination world coordinates map into the source CRS
#[derive(Debug, Clone, Copy)]
enum PointMap {
    Identity,
    Project { from: Projection, to: Projection },
}

impl PointMap {
    fn new(src_crs: Option<&Crs>, dst_crs: Option<&Crs>) -> Result<Self> {
        match (src_crs, dst_crs) {
            (Some(src), Some(dst)) if !same_crs(Some(src), Some(dst)) => Ok(PointMap::Project {
                from: Projection::from_crs(dst)?,
                to: Projection::from_crs(src)?,
            }),
            _ => Ok(PointMap::Identity),
        }
    }

    #[inline]
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            PointMap::Identity => (x, y),
            PointMap::Project { from, to } => transform_point(from, to, x, y),
        }
    }
}

/// Valid source value at integer pixel `(row, col)`, if any
#[inline]
fn valid_at<T: RasterElement>(source: &SourceGrid<'_, T>, row: isize, col: isize) -> Option<T> {
    let (rows, cols) = source.data.dim();
    if row < 0 || col < 0 || row as usize >= rows || col as usize >= cols {
        return None;
    }
    let v = source.data[(row as usize, col as usize)];
    (!source.no_data.is_nodata(v)).then_some(v)
}

/// Sample the source at fractional pixel coordinates `(col, row)`
fn sample<T: RasterElement>(
    source: &SourceGrid<'_, T>,
    col: f64,
    row: f64,
    resampling: Resampling,
) -> Option<T> {
    if !(col.is_finite() && row.is_finite()) {
        return None;
    }
    match resampling {
        Resampling::Bilinear => {
            // pixel centres sit at half-integer coordinates
            let (x, y) = (col - 0.5, row - 0.5);
            let (x0, y0) = (x.floor(), y.floor());
            let (fx, fy) = (x - x0, y - y0);
            let (c0, r0) = (x0 as isize, y0 as isize);

            let mut acc = 0.0;
            let mut weight = 0.0;
            for (dr, dc, w) in [
                (0, 0, (1.0 - fx) * (1.0 - fy)),
                (0, 1, fx * (1.0 - fy)),
                (1, 0, (1.0 - fx) * fy),
                (1, 1, fx * fy),
            ] {
                if w <= 0.0 {
                    continue;
                }
                if let Some(v) = valid_at(source, r0 + dr, c0 + dc).and_then(RasterElement::as_f64) {
                    acc += v * w;
                    weight += w;
                }
            }
            if weight > 0.0 {
                T::from_f64(acc / weight)
            } else {
                None
            }
        }
        _ => valid_at(source, row.floor() as isize, col.floor() as isize),
    }
}

/// Compute every destination cell, `None` where the source has no value
fn warp_cells<T: RasterElement>(
    source: &SourceGrid<'_, T>,
    shape: (usize, usize),
    dst_transform: &GeoTransform,
    map: PointMap,
    resampling: Resampling,
) -> Result<Vec<Option<T>>> {
    let src_inverse = source.transform.invert()?;
    let (rows, cols) = shape;

    Ok((0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                let (x, y) = dst_transform.pixel_center(col, row);
                let (sx, sy) = map.apply(x, y);
                let (src_col, src_row) = src_inverse.apply(sx, sy);
                row_data.push(sample(source, src_col, src_row, resampling));
            }
            row_data
        })
        .collect())
}

fn write_cells<T: RasterElement>(destination: &mut Array2<T>, cells: Vec<Option<T>>) {
    for (dst, cell) in destination.iter_mut().zip(cells) {
        if let Some(v) = cell {
            *dst = v;
        }
    }
}

/// Destination grid covering `source` once projected by `map`, keeping
/// the source's pixel counts.
fn projected_grid<T>(source: &SourceGrid<'_, T>, map: PointMap) -> GeoTransform {
    let (rows, cols) = source.data.dim();
    let (mut x_min, mut y_min) = (f64::INFINITY, f64::INFINITY);
    let (mut x_max, mut y_max) = (f64::NEG_INFINITY, f64::NEG_INFINITY);

    // sample the edges, not only the corners, since projected edges bend
    let steps = 16;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        for (col, row) in [
            (t * cols as f64, 0.0),
            (t * cols as f64, rows as f64),
            (0.0, t * rows as f64),
            (cols as f64, t * rows as f64),
        ] {
            let (x, y) = source.transform.apply(col, row);
            let (px, py) = map.apply(x, y);
            x_min = x_min.min(px);
            x_max = x_max.max(px);
            y_min = y_min.min(py);
            y_max = y_max.max(py);
        }
    }

    GeoTransform::new(
        x_min,
        y_max,
        (x_max - x_min) / cols as f64,
        -(y_max - y_min) / rows as f64,
    )
}

impl Reproject for GridResampler {
    fn reproject<T: RasterElement>(
        &self,
        source: &SourceGrid<'_, T>,
        dst_crs: &Crs,
        resampling: Resampling,
    ) -> Result<(Array2<T>, GeoTransform)> {
        Self::check_method(resampling)?;
        let src_crs = source
            .crs
            .ok_or_else(|| Error::InvalidState("source coordinate reference system is not set".to_string()))?;
        let (rows, cols) = source.data.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        // forward map for the output extent, backward map for sampling
        let forward = PointMap::new(Some(dst_crs), Some(src_crs))?;
        let dst_transform = projected_grid(source, forward);
        debug!(src = %src_crs, dst = %dst_crs, ?dst_transform, "reprojecting grid");

        let fill = source.no_data.value().unwrap_or_else(T::zero);
        let mut destination = Array2::from_elem((rows, cols), fill);
        self.reproject_into(source, &mut destination, &dst_transform, Some(dst_crs), resampling)?;
        Ok((destination, dst_transform))
    }

    fn reproject_into<T: RasterElement>(
        &self,
        source: &SourceGrid<'_, T>,
        destination: &mut Array2<T>,
        dst_transform: &GeoTransform,
        dst_crs: Option<&Crs>,
        resampling: Resampling,
    ) -> Result<()> {
        Self::check_method(resampling)?;
        let map = PointMap::new(source.crs, dst_crs)?;
        let cells = warp_cells(source, destination.dim(), dst_transform, map, resampling)?;
        write_cells(destination, cells);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use georaster_core::{NoData, RasterArray};
    use ndarray::array;

    fn source_raster() -> RasterArray<f64> {
        RasterArray::new(
            array![[0.0, 10.0], [20.0, 30.0]],
            GeoTransform::new(0.0, 2.0, 1.0, -1.0),
            None,
            NoData::Value(-1.0),
        )
    }

    #[test]
    fn test_nearest_upsample() {
        let raster = source_raster();
        let up = raster.resample(2.0, Resampling::Nearest, &GridResampler).unwrap();
        assert_eq!(up.shape(), (4, 4));
        assert_eq!(
            up.to_array(),
            array![
                [0.0, 0.0, 10.0, 10.0],
                [0.0, 0.0, 10.0, 10.0],
                [20.0, 20.0, 30.0, 30.0],
                [20.0, 20.0, 30.0, 30.0]
            ]
        );
    }

    #[test]
    fn test_bilinear_centre() {
        let raster = source_raster();
        let target = RasterArray::new(
            Array2::<f64>::zeros((1, 1)),
            GeoTransform::new(0.5, 1.5, 1.0, -1.0),
            None,
            NoData::Unset,
        );
        let out = raster.resample_to(&target, Resampling::Bilinear, &GridResampler).unwrap();
        // centre (1.0, 1.0) sits between all four pixel centres
        assert_relative_eq!(out.data()[(0, 0)], 15.0);
    }

    #[test]
    fn test_bilinear_skips_no_data() {
        let raster = RasterArray::new(
            array![[0.0, -1.0], [20.0, 30.0]],
            GeoTransform::new(0.0, 2.0, 1.0, -1.0),
            None,
            NoData::Value(-1.0),
        );
        let target = RasterArray::new(
            Array2::<f64>::zeros((1, 1)),
            GeoTransform::new(0.5, 1.5, 1.0, -1.0),
            None,
            NoData::Unset,
        );
        let out = raster.resample_to(&target, Resampling::Bilinear, &GridResampler).unwrap();
        assert_relative_eq!(out.data()[(0, 0)], 50.0 / 3.0);
    }

    #[test]
    fn test_uncovered_cells_keep_fill() {
        let raster = source_raster();
        let target = RasterArray::new(
            Array2::<f64>::zeros((1, 2)),
            GeoTransform::new(1.0, 1.0, 1.0, -1.0),
            None,
            NoData::Unset,
        );
        let out = raster.resample_to(&target, Resampling::Nearest, &GridResampler).unwrap();
        assert_eq!(out.to_array(), array![[30.0, -1.0]]);
    }

    #[test]
    fn test_unsupported_kernel() {
        let raster = source_raster();
        assert!(matches!(
            raster.resample(2.0, Resampling::Cubic, &GridResampler),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_reproject_utm_to_wgs84() {
        // 10 km square in UTM 30N around Madrid
        let raster = RasterArray::new(
            Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f32),
            GeoTransform::new(435_000.0, 4_480_000.0, 1_000.0, -1_000.0),
            Some(Crs::from_epsg(32630)),
            NoData::Value(-9999.0f32),
        );
        let out = raster.to_crs(Crs::wgs84(), Resampling::Nearest, &GridResampler).unwrap();
        assert_eq!(out.crs(), Some(&Crs::wgs84()));
        assert_eq!(out.shape(), (10, 10));
        let b = out.bounds();
        assert!(b.x_min > -4.0 && b.x_max < -3.5, "longitudes {:?}", b);
        assert!(b.y_min > 40.3 && b.y_max < 40.5, "latitudes {:?}", b);
        assert!(out.data().iter().any(|&v| v != -9999.0));
    }

    #[test]
    fn test_unknown_projection() {
        let raster = source_raster().set_crs(Crs::web_mercator()).unwrap();
        let result = raster.to_crs(Crs::wgs84(), Resampling::Nearest, &GridResampler);
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }
}
