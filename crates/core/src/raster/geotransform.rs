//! Affine geotransformation for rasters

use crate::error::{Error, Result};
use crate::raster::Window;
use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Maps pixel coordinates (col, row) to geographic coordinates (x, y):
/// ```text
/// x = pixel_width  * col + row_rotation * row + origin_x      (a, b, c)
/// y = col_rotation * col + pixel_height * row + origin_y      (d, e, f)
/// ```
///
/// For north-up images `row_rotation` and `col_rotation` are 0 and
/// `pixel_height` is negative, because row 0 is the top of the raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner (c)
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner (f)
    pub origin_y: f64,
    /// Pixel width, cell size in X direction (a)
    pub pixel_width: f64,
    /// Pixel height, cell size in Y direction, usually negative (e)
    pub pixel_height: f64,
    /// Row term of the x equation (b)
    pub row_rotation: f64,
    /// Column term of the y equation (d)
    pub col_rotation: f64,
}

/// Geographic extent of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Smallest extent covering both `self` and `other`.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x_min: self.x_min.min(other.x_min),
            x_max: self.x_max.max(other.x_max),
            y_min: self.y_min.min(other.y_min),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// The identity mapping: pixel coordinates are geographic coordinates.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Create from affine-ordered coefficients `[a, b, c, d, e, f]`
    pub fn from_coefficients(coeffs: [f64; 6]) -> Self {
        Self {
            pixel_width: coeffs[0],
            row_rotation: coeffs[1],
            origin_x: coeffs[2],
            col_rotation: coeffs[3],
            pixel_height: coeffs[4],
            origin_y: coeffs[5],
        }
    }

    /// Affine-ordered coefficients `[a, b, c, d, e, f]`
    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.pixel_width,
            self.row_rotation,
            self.origin_x,
            self.col_rotation,
            self.pixel_height,
            self.origin_y,
        ]
    }

    /// Create from GDAL-style array [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert to GDAL-style array
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Forward map of fractional pixel coordinates to geographic coordinates.
    ///
    /// Integer inputs address pixel corners; add 0.5 for centres.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.pixel_width * col + self.row_rotation * row + self.origin_x;
        let y = self.col_rotation * col + self.pixel_height * row + self.origin_y;
        (x, y)
    }

    /// Geographic coordinates of the centre of pixel (col, row)
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Algebraic inverse, mapping geographic coordinates back to pixels.
    pub fn invert(&self) -> Result<GeoTransform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(Error::DegenerateTransform { determinant: det });
        }

        let ia = self.pixel_height / det;
        let ib = -self.row_rotation / det;
        let id = -self.col_rotation / det;
        let ie = self.pixel_width / det;

        Ok(Self {
            pixel_width: ia,
            row_rotation: ib,
            origin_x: -self.origin_x * ia - self.origin_y * ib,
            col_rotation: id,
            pixel_height: ie,
            origin_y: -self.origin_x * id - self.origin_y * ie,
        })
    }

    /// Convert geographic coordinates to fractional pixel coordinates (col, row).
    ///
    /// Use `.floor()` to get integer indices.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(self.invert()?.apply(x, y))
    }

    /// Affine product `self * other`: `other` is applied first.
    pub fn compose(&self, other: &GeoTransform) -> GeoTransform {
        let [sa, sb, sc, sd, se, sf] = self.coefficients();
        let [oa, ob, oc, od, oe, of] = other.coefficients();
        GeoTransform::from_coefficients([
            sa * oa + sb * od,
            sa * ob + sb * oe,
            sa * oc + sb * of + sc,
            sd * oa + se * od,
            sd * ob + se * oe,
            sd * oc + se * of + sf,
        ])
    }

    /// Scale the pixel grid, keeping origin and orientation.
    pub fn scale(&self, sx: f64, sy: f64) -> GeoTransform {
        self.compose(&GeoTransform::new(0.0, 0.0, sx, sy))
    }

    /// Shift the pixel grid by `(cols, rows)` pixels.
    pub fn translation(&self, cols: f64, rows: f64) -> GeoTransform {
        let (x, y) = self.apply(cols, rows);
        GeoTransform {
            origin_x: x,
            origin_y: y,
            ..*self
        }
    }

    /// Transform of a sub-window: its origin is the window's upper-left corner.
    pub fn window_transform(&self, window: &Window) -> GeoTransform {
        self.translation(window.col_off as f64, window.row_off as f64)
    }

    /// Pixel size as positive `(x_res, y_res)` for north-up rasters
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width, -self.pixel_height)
    }

    /// Get the cell size (assumes square pixels and no rotation)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Check if this is a north-up image (no rotation)
    pub fn is_north_up(&self) -> bool {
        self.row_rotation.abs() < 1e-10
            && self.col_rotation.abs() < 1e-10
            && self.pixel_height < 0.0
    }

    /// Coefficient-wise comparison within `tolerance`
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        self.coefficients()
            .iter()
            .zip(other.coefficients().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Calculate the bounding box for a raster of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> Bounds {
        let (w, h) = (width as f64, height as f64);
        let (x0, y0) = self.apply(0.0, 0.0);
        let (x1, y1) = self.apply(w, 0.0);
        let (x2, y2) = self.apply(0.0, h);
        let (x3, y3) = self.apply(w, h);

        Bounds {
            x_min: x0.min(x1).min(x2).min(x3),
            x_max: x0.max(x1).max(x2).max(x3),
            y_min: y0.min(y1).min(y2).min(y3),
            y_max: y0.max(y1).max(y2).max(y3),
        }
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
