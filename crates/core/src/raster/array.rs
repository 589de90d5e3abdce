//! Main raster type

use crate::crs::{same_crs, Crs};
use crate::error::{Error, Result};
use crate::features::{geometry_window, raster_geometry_mask, GeometryMaskOptions, Rasterize};
use crate::raster::{cast_value, Bounds, DataType, GeoTransform, NoData, RasterElement, Window};
use crate::warp::{Reproject, Resampling, SourceGrid};
use geo::Geometry;
use ndarray::{s, Array1, Array2, ArrayView2, Zip};
use std::fmt;
use tracing::debug;

/// A georeferenced 2D raster grid.
///
/// `RasterArray<T>` owns a `(height, width)` buffer of `T` together with
/// the affine transform tying pixels to geographic space, an optional CRS
/// and a no-data policy. Geographic bounds are always derived from the
/// transform and the buffer shape.
///
/// Rasters are never mutated in place: every operation that looks like a
/// mutation (`set_crs`, `set_no_data_value`, `clip`, arithmetic, ...)
/// returns a new raster with a freshly allocated buffer.
///
/// # Example
///
/// ```ignore
/// use georaster_core::{GeoTransform, NoData, RasterArray};
/// use ndarray::array;
///
/// let raster = RasterArray::new(
///     array![[1.0, 2.0], [3.0, -1.0]],
///     GeoTransform::new(500_000.0, 4_100_000.0, 30.0, -30.0),
///     Some(32633.into()),
///     NoData::Value(-1.0),
/// );
/// let doubled = (&raster * 2.0)?;
/// assert_eq!(doubled.data()[(1, 1)], -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct RasterArray<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<Crs>,
    no_data: NoData<T>,
}

/// Options for [`RasterArray::mask`]
#[derive(Debug, Clone, Copy)]
pub struct MaskOptions<T> {
    /// Value written to masked cells; defaults to the raster's no-data value
    pub fill_value: Option<T>,
    pub all_touched: bool,
    /// Fill the cells inside the shapes instead of outside
    pub invert: bool,
}

impl<T> Default for MaskOptions<T> {
    fn default() -> Self {
        Self {
            fill_value: None,
            all_touched: false,
            invert: false,
        }
    }
}

impl<T: RasterElement> RasterArray<T> {
    /// Wrap a buffer with its georeferencing
    pub fn new(
        data: Array2<T>,
        transform: GeoTransform,
        crs: Option<Crs>,
        no_data: impl Into<NoData<T>>,
    ) -> Self {
        Self {
            data,
            transform,
            crs,
            no_data: no_data.into(),
        }
    }

    /// Create a raster from row-major values with the default transform
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::new(array, GeoTransform::default(), None, NoData::Unset))
    }

    /// Same raster, placed by another transform
    pub fn with_transform(self, transform: GeoTransform) -> Self {
        Self { transform, ..self }
    }

    /// A raster sharing this one's metadata, holding `data`
    pub(crate) fn derive(&self, data: Array2<T>) -> Self {
        Self {
            data,
            transform: self.transform,
            crs: self.crs.clone(),
            no_data: self.no_data,
        }
    }

    // Dimensions

    /// Number of columns
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> DataType {
        T::DTYPE
    }

    // Data access

    /// Read-only view of the buffer
    pub fn data(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Copy of the buffer
    pub fn to_array(&self) -> Array2<T> {
        self.data.clone()
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.height(),
                cols: self.width(),
            })
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// The CRS, or `InvalidState` when none was assigned
    pub fn require_crs(&self) -> Result<&Crs> {
        self.crs
            .as_ref()
            .ok_or_else(|| Error::InvalidState("coordinate reference system is not set".to_string()))
    }

    pub fn no_data(&self) -> NoData<T> {
        self.no_data
    }

    pub fn no_data_value(&self) -> Option<T> {
        self.no_data.value()
    }

    /// `true` where a cell holds no-data; all-false when no sentinel is set
    pub fn no_data_mask(&self) -> Array2<bool> {
        self.no_data.mask(self.data.view())
    }

    /// Pixel size as `(x_res, y_res)`, both positive for north-up rasters
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    pub fn x_resolution(&self) -> f64 {
        self.resolution().0
    }

    pub fn y_resolution(&self) -> f64 {
        self.resolution().1
    }

    pub fn bounds(&self) -> Bounds {
        self.transform.bounds(self.width(), self.height())
    }

    pub fn x_min(&self) -> f64 {
        self.bounds().x_min
    }

    pub fn x_max(&self) -> f64 {
        self.bounds().x_max
    }

    pub fn y_min(&self) -> f64 {
        self.bounds().y_min
    }

    pub fn y_max(&self) -> f64 {
        self.bounds().y_max
    }

    /// X coordinate of every column's pixel centre
    pub fn x_coordinates(&self) -> Array1<f64> {
        (0..self.width())
            .map(|col| self.transform.pixel_center(col, 0).0)
            .collect()
    }

    /// Y coordinate of every row's pixel centre, top row first
    pub fn y_coordinates(&self) -> Array1<f64> {
        (0..self.height())
            .map(|row| self.transform.pixel_center(0, row).1)
            .collect()
    }

    /// Borrow this raster as the source side of a reprojection
    pub fn source_grid(&self) -> SourceGrid<'_, T> {
        SourceGrid {
            data: self.data.view(),
            transform: self.transform,
            crs: self.crs.as_ref(),
            no_data: self.no_data,
        }
    }

    /// Fails with `IncompatibleOperands` unless CRS, transform, no-data
    /// policy and shape all agree.
    pub fn check_compatible(&self, other: &RasterArray<T>) -> Result<()> {
        if !same_crs(self.crs(), other.crs()) {
            return Err(Error::IncompatibleOperands {
                property: "crs",
                detail: format!("{} vs {}", crs_label(self.crs()), crs_label(other.crs())),
            });
        }
        if self.transform != other.transform {
            return Err(Error::IncompatibleOperands {
                property: "transform",
                detail: format!("{:?} vs {:?}", self.transform.coefficients(), other.transform.coefficients()),
            });
        }
        if !self.no_data.equals(&other.no_data) {
            return Err(Error::IncompatibleOperands {
                property: "no-data value",
                detail: format!("{} vs {}", self.no_data, other.no_data),
            });
        }
        if self.shape() != other.shape() {
            return Err(Error::IncompatibleOperands {
                property: "shape",
                detail: format!("{:?} vs {:?}", self.shape(), other.shape()),
            });
        }
        Ok(())
    }

    // State transitions

    /// Assign a CRS to a raster that has none.
    ///
    /// Changing an existing CRS requires [`RasterArray::to_crs`].
    pub fn set_crs(&self, crs: impl Into<Crs>) -> Result<Self> {
        if let Some(current) = &self.crs {
            return Err(Error::InvalidState(format!(
                "coordinate reference system is already set to {}; use to_crs() to reproject",
                current
            )));
        }
        let crs = crs.into();
        debug!(%crs, "assigning crs");
        Ok(Self {
            crs: Some(crs),
            ..self.clone()
        })
    }

    /// Reproject into `crs`, resampling the buffer with `reprojector`.
    pub fn to_crs<R: Reproject>(
        &self,
        crs: impl Into<Crs>,
        resampling: Resampling,
        reprojector: &R,
    ) -> Result<Self> {
        let src_crs = self.require_crs()?;
        let dst_crs = crs.into();
        debug!(src = %src_crs, dst = %dst_crs, %resampling, "reprojecting raster");

        let (data, transform) = reprojector.reproject(&self.source_grid(), &dst_crs, resampling)?;
        Ok(Self {
            data,
            transform,
            crs: Some(dst_crs),
            no_data: self.no_data,
        })
    }

    /// Replace the no-data sentinel, rewriting the cells it flagged.
    pub fn set_no_data_value(&self, value: T) -> Self {
        Self {
            data: self.no_data.apply_new_value(self.data.view(), value),
            transform: self.transform,
            crs: self.crs.clone(),
            no_data: NoData::Value(value),
        }
    }

    /// Drop the no-data sentinel; cell values are kept as they are.
    pub fn unset_no_data_value(&self) -> Self {
        Self {
            no_data: NoData::Unset,
            ..self.clone()
        }
    }

    // Derivations

    /// Cast every cell to `U`.
    ///
    /// No-data cells become the cast sentinel; any other value that `U`
    /// cannot represent fails with `InvalidCast`.
    pub fn astype<U: RasterElement>(&self) -> Result<RasterArray<U>> {
        let no_data = self.no_data.cast::<U>()?;

        let mut values = Vec::with_capacity(self.len());
        for &v in self.data.iter() {
            let cast = match no_data {
                NoData::Value(nd) if self.no_data.is_nodata(v) => nd,
                _ => cast_value::<T, U>(v)?,
            };
            values.push(cast);
        }
        let data = Array2::from_shape_vec(self.shape(), values)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(RasterArray {
            data,
            transform: self.transform,
            crs: self.crs.clone(),
            no_data,
        })
    }

    /// Copy of the pixels inside `window`, which is first clamped to the raster.
    pub fn slice(&self, window: Window) -> Self {
        let window = window.intersection(&Window::full(self.width(), self.height()));
        let data = self
            .data
            .slice(s![window.row_range(), window.col_range()])
            .to_owned();

        Self {
            data,
            transform: self.transform.window_transform(&window),
            crs: self.crs.clone(),
            no_data: self.no_data,
        }
    }

    /// Crop to the minimal window covering `shapes`.
    pub fn clip(&self, shapes: &[Geometry<f64>]) -> Result<Self> {
        let window = geometry_window(&self.transform, self.width(), self.height(), shapes, 0.0, 0.0)?;
        debug!(?window, "clipping raster");
        Ok(self.slice(window))
    }

    /// Fill the cells outside `shapes` (inside, with `invert`).
    ///
    /// The fill value defaults to the no-data value; when neither is
    /// available this fails with `Configuration`. The no-data policy is
    /// kept as is, so an unset raster stays unset.
    pub fn mask<R: Rasterize + ?Sized>(
        &self,
        shapes: &[Geometry<f64>],
        options: &MaskOptions<T>,
        rasterizer: &R,
    ) -> Result<Self> {
        let fill = options.fill_value.or(self.no_data.value()).ok_or_else(|| {
            Error::Configuration("no fill value given and the raster has no no-data value".to_string())
        })?;

        let geometry_mask = raster_geometry_mask(
            &self.transform,
            self.width(),
            self.height(),
            shapes,
            &GeometryMaskOptions {
                all_touched: options.all_touched,
                invert: options.invert,
                crop: false,
                ..Default::default()
            },
            rasterizer,
        )?;

        let mut data = self.data.clone();
        Zip::from(&mut data)
            .and(&geometry_mask.mask)
            .for_each(|v, &masked| {
                if masked {
                    *v = fill;
                }
            });

        Ok(self.derive(data))
    }

    /// Resample by a scale factor: the new shape is `round(width * scale)`
    /// by `round(height * scale)` over the same extent.
    pub fn resample<R: Reproject>(
        &self,
        scale: f64,
        resampling: Resampling,
        reprojector: &R,
    ) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::Configuration(format!(
                "resampling scale must be positive, got {}",
                scale
            )));
        }
        let new_width = (self.width() as f64 * scale).round() as usize;
        let new_height = (self.height() as f64 * scale).round() as usize;
        if new_width == 0 || new_height == 0 {
            return Err(Error::InvalidDimensions {
                width: new_width,
                height: new_height,
            });
        }

        let dst_transform = self.transform.scale(
            self.width() as f64 / new_width as f64,
            self.height() as f64 / new_height as f64,
        );
        debug!(new_width, new_height, %resampling, "resampling raster");

        let mut destination = Array2::from_elem((new_height, new_width), self.fill_value());
        reprojector.reproject_into(
            &self.source_grid(),
            &mut destination,
            &dst_transform,
            self.crs.as_ref(),
            resampling,
        )?;

        Ok(Self {
            data: destination,
            transform: dst_transform,
            crs: self.crs.clone(),
            no_data: self.no_data,
        })
    }

    /// Resample onto `target`'s grid: its shape, transform and CRS.
    pub fn resample_to<U: RasterElement, R: Reproject>(
        &self,
        target: &RasterArray<U>,
        resampling: Resampling,
        reprojector: &R,
    ) -> Result<Self> {
        let dst_crs = target.crs().or(self.crs()).cloned();
        let mut destination = Array2::from_elem(target.shape(), self.fill_value());
        reprojector.reproject_into(
            &self.source_grid(),
            &mut destination,
            target.transform(),
            dst_crs.as_ref(),
            resampling,
        )?;

        Ok(Self {
            data: destination,
            transform: *target.transform(),
            crs: dst_crs,
            no_data: self.no_data,
        })
    }

    /// Values at geographic points `(xs[i], ys[i])`.
    ///
    /// Only nearest-neighbour lookup is implemented. Points outside the
    /// raster take the value of the closest edge pixel.
    pub fn select(&self, xs: &[f64], ys: &[f64], method: Resampling) -> Result<Vec<T>> {
        if method != Resampling::Nearest {
            return Err(Error::Unsupported(format!(
                "'{}' point selection, only 'nearest' is implemented",
                method
            )));
        }
        if xs.len() != ys.len() {
            return Err(Error::Configuration(format!(
                "got {} x coordinates and {} y coordinates",
                xs.len(),
                ys.len()
            )));
        }
        if self.is_empty() {
            return Err(Error::InvalidDimensions {
                width: self.width(),
                height: self.height(),
            });
        }

        let inverse = self.transform.invert()?;
        let (max_col, max_row) = ((self.width() - 1) as f64, (self.height() - 1) as f64);
        Ok(xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| {
                let (col, row) = inverse.apply(x, y);
                let col = col.floor().clamp(0.0, max_col) as usize;
                let row = row.floor().clamp(0.0, max_row) as usize;
                self.data[(row, col)]
            })
            .collect())
    }

    // Reductions over valid cells

    fn valid_values(&self) -> impl Iterator<Item = T> + '_ {
        self.data
            .iter()
            .copied()
            .filter(move |&v| !self.no_data.is_nodata(v))
    }

    pub fn sum(&self) -> T {
        self.valid_values().fold(T::zero(), |acc, v| acc.elem_add(v))
    }

    pub fn prod(&self) -> T {
        self.valid_values().fold(T::one(), |acc, v| acc.elem_mul(v))
    }

    /// Smallest valid value, `None` when every cell is no-data
    pub fn min(&self) -> Option<T> {
        self.valid_values()
            .reduce(|acc, v| if v < acc { v } else { acc })
    }

    /// Largest valid value, `None` when every cell is no-data
    pub fn max(&self) -> Option<T> {
        self.valid_values()
            .reduce(|acc, v| if v > acc { v } else { acc })
    }

    pub fn all(&self) -> bool {
        self.valid_values().all(|v| v.is_truthy())
    }

    pub fn any(&self) -> bool {
        self.valid_values().any(|v| v.is_truthy())
    }

    /// Pre-fill value for freshly allocated destination buffers
    fn fill_value(&self) -> T {
        self.no_data.value().unwrap_or_else(T::zero)
    }
}

fn crs_label(crs: Option<&Crs>) -> String {
    crs.map_or_else(|| "None".to_string(), |c| c.to_string())
}

impl<T: RasterElement> fmt::Display for RasterArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bounds();
        writeln!(f, "RasterArray")?;
        writeln!(f, "===========")?;
        writeln!(f, "dimensions : {}, {} (x, y)", self.width(), self.height())?;
        writeln!(
            f,
            "resolution : {}, {} (x, y)",
            self.transform.pixel_width, self.transform.pixel_height
        )?;
        writeln!(
            f,
            "extent     : {}, {}, {}, {} (xmin, xmax, ymin, ymax)",
            b.x_min, b.x_max, b.y_min, b.y_max
        )?;
        writeln!(f, "crs        : {}", crs_label(self.crs()))?;
        writeln!(f, "no_data    : {}", self.no_data)?;
        writeln!(f, "dtype      : {}", self.dtype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::{square, BoxRasterizer};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn sample() -> RasterArray<f64> {
        let data = Array2::from_shape_fn((4, 5), |(r, c)| (r * 5 + c) as f64);
        RasterArray::new(
            data,
            GeoTransform::new(100.0, 200.0, 10.0, -10.0),
            Some(Crs::from_epsg(32633)),
            NoData::Value(-1.0),
        )
    }

    /// Returns the source unchanged when the CRS matches, otherwise a
    /// 1x1 raster holding the cell count.
    struct CountingReprojector;

    impl Reproject for CountingReprojector {
        fn reproject<T: RasterElement>(
            &self,
            source: &SourceGrid<'_, T>,
            _dst_crs: &Crs,
            _resampling: Resampling,
        ) -> Result<(Array2<T>, GeoTransform)> {
            let count = T::from_f64(source.data.len() as f64).unwrap_or_else(T::zero);
            Ok((Array2::from_elem((1, 1), count), GeoTransform::new(0.0, 0.0, 1.0, -1.0)))
        }

        fn reproject_into<T: RasterElement>(
            &self,
            source: &SourceGrid<'_, T>,
            destination: &mut Array2<T>,
            _dst_transform: &GeoTransform,
            _dst_crs: Option<&Crs>,
            _resampling: Resampling,
        ) -> Result<()> {
            destination.fill(source.data[(0, 0)]);
            Ok(())
        }
    }

    #[test]
    fn test_dimensions_and_bounds() {
        let r = sample();
        assert_eq!(r.width(), 5);
        assert_eq!(r.height(), 4);
        assert_eq!(r.shape(), (4, 5));
        assert_eq!(r.bounds(), r.transform().bounds(5, 4));
        assert_relative_eq!(r.x_min(), 100.0);
        assert_relative_eq!(r.x_max(), 150.0);
        assert_relative_eq!(r.y_min(), 160.0);
        assert_relative_eq!(r.y_max(), 200.0);
        assert_eq!(r.resolution(), (10.0, 10.0));
    }

    #[test]
    fn test_coordinates_are_pixel_centres() {
        let r = sample();
        assert_eq!(r.x_coordinates().to_vec(), vec![105.0, 115.0, 125.0, 135.0, 145.0]);
        assert_eq!(r.y_coordinates().to_vec(), vec![195.0, 185.0, 175.0, 165.0]);
    }

    #[test]
    fn test_set_crs_once() {
        let r = RasterArray::new(array![[1u8]], GeoTransform::default(), None, NoData::Unset);
        let with_crs = r.set_crs(4326u32).unwrap();
        assert_eq!(with_crs.crs(), Some(&Crs::wgs84()));
        assert!(r.crs().is_none());
        assert!(matches!(with_crs.set_crs(3857u32), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_to_crs_requires_crs() {
        let r = RasterArray::new(array![[1.0f32]], GeoTransform::default(), None, NoData::Unset);
        let result = r.to_crs(4326u32, Resampling::Nearest, &CountingReprojector);
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_to_crs_wraps_collaborator_output() {
        let r = sample();
        let out = r.to_crs(Crs::web_mercator(), Resampling::Bilinear, &CountingReprojector).unwrap();
        assert_eq!(out.crs(), Some(&Crs::web_mercator()));
        assert_eq!(out.shape(), (1, 1));
        assert_eq!(out.data()[(0, 0)], 20.0);
        assert_eq!(out.no_data(), NoData::Value(-1.0));
    }

    #[test]
    fn test_set_no_data_value_keeps_mask_positions() {
        let r = RasterArray::new(
            array![[-1, 2], [3, -1]],
            GeoTransform::default(),
            None,
            NoData::Value(-1),
        );
        let before = r.no_data_mask();
        let changed = r.set_no_data_value(-9999);
        assert_eq!(changed.no_data_mask(), before);
        assert_eq!(changed.data()[(0, 0)], -9999);
        assert_eq!(r.data()[(0, 0)], -1);
        assert!(r.unset_no_data_value().no_data_mask().iter().all(|&m| !m));
    }

    #[test]
    fn test_astype() {
        let r = RasterArray::new(
            array![[1.0, f64::NAN], [3.0, 4.0]],
            GeoTransform::default(),
            None,
            NoData::Value(f64::NAN),
        );
        // NaN sentinel cannot be an integer
        assert!(matches!(r.astype::<i32>(), Err(Error::InvalidCast { .. })));

        let r = r.set_no_data_value(-1.0);
        let ints = r.astype::<i32>().unwrap();
        assert_eq!(ints.dtype(), DataType::I32);
        assert_eq!(ints.to_array(), array![[1, -1], [3, 4]]);
        assert_eq!(ints.no_data(), NoData::Value(-1));
    }

    #[test]
    fn test_slice_bounds_follow_window() {
        let r = sample();
        let window = Window::new(1, 2, 3, 2);
        let sub = r.slice(window);
        assert_eq!(sub.shape(), (2, 3));
        assert_eq!(sub.data()[(0, 0)], 11.0);

        let (x0, y0) = r.transform().apply(1.0, 2.0);
        let (x1, y1) = r.transform().apply(4.0, 4.0);
        let b = sub.bounds();
        assert_relative_eq!(b.x_min, x0);
        assert_relative_eq!(b.y_max, y0);
        assert_relative_eq!(b.x_max, x1);
        assert_relative_eq!(b.y_min, y1);
    }

    #[test]
    fn test_slice_clamps() {
        let sub = sample().slice(Window::new(3, 3, 10, 10));
        assert_eq!(sub.shape(), (1, 2));
    }

    #[test]
    fn test_clip() {
        let r = sample();
        // covers cols 1..3, rows 1..2
        let clipped = r.clip(&[square(112.0, 182.0, 128.0, 188.0)]).unwrap();
        assert_eq!(clipped.shape(), (1, 2));
        assert_eq!(clipped.data()[(0, 0)], 6.0);
        assert_relative_eq!(clipped.x_min(), 110.0);
        assert_relative_eq!(clipped.y_max(), 190.0);
    }

    #[test]
    fn test_clip_outside_is_empty() {
        let clipped = sample().clip(&[square(0.0, 0.0, 10.0, 10.0)]).unwrap();
        assert!(clipped.is_empty());
    }

    #[test]
    fn test_mask_fills_outside() {
        let r = sample();
        let masked = r
            .mask(&[square(100.0, 180.0, 120.0, 200.0)], &MaskOptions::default(), &BoxRasterizer)
            .unwrap();
        assert_eq!(masked.data()[(0, 0)], 0.0);
        assert_eq!(masked.data()[(1, 1)], 6.0);
        assert_eq!(masked.data()[(3, 4)], -1.0);
        // source untouched
        assert_eq!(r.data()[(3, 4)], 19.0);
    }

    #[test]
    fn test_mask_needs_fill_value() {
        let r = sample().unset_no_data_value();
        let shapes = [square(100.0, 180.0, 120.0, 200.0)];
        let err = r.mask(&shapes, &MaskOptions::default(), &BoxRasterizer);
        assert!(matches!(err, Err(Error::Configuration(_))));

        let options = MaskOptions {
            fill_value: Some(-5.0),
            invert: true,
            ..Default::default()
        };
        let masked = r.mask(&shapes, &options, &BoxRasterizer).unwrap();
        assert_eq!(masked.data()[(0, 0)], -5.0);
        assert_eq!(masked.data()[(3, 4)], 19.0);
    }

    #[test]
    fn test_mask_keeps_unset_no_data() {
        let r = sample().unset_no_data_value();
        let options = MaskOptions {
            fill_value: Some(6.0),
            ..Default::default()
        };
        let masked = r
            .mask(&[square(100.0, 180.0, 120.0, 200.0)], &options, &BoxRasterizer)
            .unwrap();
        assert_eq!(masked.no_data(), NoData::Unset);
        assert_eq!(masked.data()[(3, 4)], 6.0);
        // a valid cell equal to the fill stays valid
        assert_eq!(masked.data()[(1, 1)], 6.0);
        assert!(!masked.no_data_mask()[(1, 1)]);
    }

    #[test]
    fn test_select_nearest_clamps() {
        let r = sample();
        let values = r
            .select(&[101.0, 149.0, -1000.0, 1000.0], &[199.0, 161.0, 1000.0, -1000.0], Resampling::Nearest)
            .unwrap();
        assert_eq!(values, vec![0.0, 19.0, 0.0, 19.0]);
    }

    #[test]
    fn test_select_other_method_unsupported() {
        let result = sample().select(&[101.0], &[199.0], Resampling::Bilinear);
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_resample_shape_and_transform() {
        let r = sample();
        let up = r.resample(2.0, Resampling::Nearest, &CountingReprojector).unwrap();
        assert_eq!(up.shape(), (8, 10));
        assert_eq!(up.resolution(), (5.0, 5.0));
        assert_eq!(up.bounds(), r.bounds());
        assert!(matches!(
            r.resample(0.0, Resampling::Nearest, &CountingReprojector),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_resample_to_target_grid() {
        let r = sample();
        let target = RasterArray::new(
            Array2::<u8>::zeros((2, 3)),
            GeoTransform::new(100.0, 200.0, 20.0, -20.0),
            None,
            NoData::Unset,
        );
        let out = r.resample_to(&target, Resampling::Nearest, &CountingReprojector).unwrap();
        assert_eq!(out.shape(), (2, 3));
        assert_eq!(out.transform(), target.transform());
        assert_eq!(out.crs(), r.crs());
    }

    #[test]
    fn test_reductions_skip_no_data() {
        let r = RasterArray::new(
            array![[1.0, -1.0], [3.0, 4.0]],
            GeoTransform::default(),
            None,
            NoData::Value(-1.0),
        );
        assert_eq!(r.sum(), 8.0);
        assert_eq!(r.prod(), 12.0);
        assert_eq!(r.min(), Some(1.0));
        assert_eq!(r.max(), Some(4.0));
        assert!(r.all());
        assert!(r.any());

        let empty = RasterArray::new(array![[-1.0]], GeoTransform::default(), None, NoData::Value(-1.0));
        assert_eq!(empty.min(), None);
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.contains("dimensions : 5, 4 (x, y)"));
        assert!(text.contains("crs        : EPSG:32633"));
        assert!(text.contains("dtype      : f64"));
    }
}
