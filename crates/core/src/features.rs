//! Geometry windows and geometry masks
//!
//! Maps vector shapes into a raster's pixel grid: the minimal window
//! covering a set of geometries, and the boolean mask of pixels inside or
//! outside them. Burning polygons into pixels is delegated to a
//! [`Rasterize`] implementation.

use crate::error::{Error, Result};
use crate::raster::window::SignedWindow;
use crate::raster::{GeoTransform, Window};
use geo::{BoundingRect, Geometry};
use ndarray::Array2;
use tracing::trace;

/// External polygon rasterization primitive.
pub trait Rasterize {
    /// Burn `shapes` into a boolean grid of `out_shape` (rows, cols).
    ///
    /// Pixels touched by a shape get `default_value`, all others `fill`.
    /// With `all_touched` every pixel the shape intersects is burned,
    /// otherwise only pixels whose centre lies inside it.
    fn rasterize(
        &self,
        shapes: &[Geometry<f64>],
        out_shape: (usize, usize),
        transform: &GeoTransform,
        all_touched: bool,
        fill: bool,
        default_value: bool,
    ) -> Result<Array2<bool>>;
}

/// Options for [`raster_geometry_mask`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryMaskOptions {
    /// Burn every pixel a shape touches, not only those with centres inside
    pub all_touched: bool,
    /// Mark pixels inside the shapes instead of outside
    pub invert: bool,
    /// Restrict the mask to the window covering the shapes
    pub crop: bool,
    pub pad_x: f64,
    pub pad_y: f64,
}

/// Result of [`raster_geometry_mask`]
#[derive(Debug, Clone)]
pub struct GeometryMask {
    /// `true` where a pixel is masked (to be excluded or filled)
    pub mask: Array2<bool>,
    /// Transform of the mask grid
    pub transform: GeoTransform,
    /// Pixel window of the mask inside the raster
    pub window: Window,
}

/// Minimal pixel window covering every shape, padded by `(pad_x, pad_y)`
/// pixels on each side and clamped to the raster.
///
/// Shapes outside the raster give a zero-size window rather than an error.
pub fn geometry_window(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    shapes: &[Geometry<f64>],
    pad_x: f64,
    pad_y: f64,
) -> Result<Window> {
    let inverse = transform.invert()?;

    let mut cols: Vec<f64> = Vec::with_capacity(shapes.len() * 4);
    let mut rows: Vec<f64> = Vec::with_capacity(shapes.len() * 4);
    for rect in shapes.iter().filter_map(|s| s.bounding_rect()) {
        let (min, max) = (rect.min(), rect.max());
        for (x, y) in [(min.x, min.y), (min.x, max.y), (max.x, min.y), (max.x, max.y)] {
            let (col, row) = inverse.apply(x, y);
            cols.push(col);
            rows.push(row);
        }
    }

    if cols.is_empty() {
        return Ok(Window::default());
    }

    let fold_min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);
    let fold_max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // bounded to one pixel beyond the raster before the integer cast
    let (col_lim, row_lim) = (width as f64 + 1.0, height as f64 + 1.0);
    let col_start = (fold_min(&cols) - pad_x).floor().clamp(-1.0, col_lim);
    let col_stop = (fold_max(&cols) + pad_x).ceil().clamp(-1.0, col_lim);
    let row_start = (fold_min(&rows) - pad_y).floor().clamp(-1.0, row_lim);
    let row_stop = (fold_max(&rows) + pad_y).ceil().clamp(-1.0, row_lim);

    let raw = SignedWindow::from_extent(
        col_start as i64,
        row_start as i64,
        col_stop as i64,
        row_stop as i64,
    );
    let window = raw.clamp_to(&Window::full(width, height));
    trace!(?raw, ?window, "geometry window");
    Ok(window)
}

/// Transform of `window` within a raster georeferenced by `transform`
pub fn window_transform(window: &Window, transform: &GeoTransform) -> GeoTransform {
    transform.window_transform(window)
}

/// Boolean mask of the pixels outside (or, with `invert`, inside) `shapes`.
///
/// With `crop` the mask only spans the window covering the shapes and
/// comes with that window's transform; otherwise it spans the full raster.
/// `crop` and `invert` are mutually exclusive.
pub fn raster_geometry_mask<R: Rasterize + ?Sized>(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    shapes: &[Geometry<f64>],
    options: &GeometryMaskOptions,
    rasterizer: &R,
) -> Result<GeometryMask> {
    if options.crop && options.invert {
        return Err(Error::Configuration(
            "crop and invert cannot both be requested".to_string(),
        ));
    }

    let (window, out_transform) = if options.crop {
        let window = geometry_window(transform, width, height, shapes, options.pad_x, options.pad_y)?;
        (window, window_transform(&window, transform))
    } else {
        (Window::full(width, height), *transform)
    };

    let (fill, default_value) = if options.invert {
        (false, true)
    } else {
        (true, false)
    };

    let mask = rasterizer.rasterize(
        shapes,
        (window.height, window.width),
        &out_transform,
        options.all_touched,
        fill,
        default_value,
    )?;

    if mask.dim() != (window.height, window.width) {
        return Err(Error::SizeMismatch {
            er: window.height,
            ec: window.width,
            ar: mask.nrows(),
            ac: mask.ncols(),
        });
    }

    Ok(GeometryMask {
        mask,
        transform: out_transform,
        window,
    })
}
