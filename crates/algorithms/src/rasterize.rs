//! Vector burn-in
//!
//! Burns geometries into a boolean pixel grid. Areal shapes burn the
//! pixels whose centre they contain, or every pixel they touch with
//! `all_touched`. Points and lines always burn the pixels they touch.

use georaster_core::features::{geometry_window, Rasterize};
use georaster_core::{GeoTransform, Result};
use geo::{Contains, Coord, Geometry, Intersects, LineString, Point, Polygon};
use ndarray::Array2;
use tracing::trace;

/// Reference [`Rasterize`] implementation backed by `geo` predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoRasterizer;

impl GeoRasterizer {
    pub fn new() -> Self {
        Self
    }
}

fn is_areal(shape: &Geometry<f64>) -> bool {
    match shape {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => true,
        Geometry::GeometryCollection(gc) => gc.iter().all(is_areal),
        _ => false,
    }
}

/// Footprint of pixel `(col, row)` in world coordinates
fn pixel_polygon(transform: &GeoTransform, col: usize, row: usize) -> Polygon<f64> {
    let (c, r) = (col as f64, row as f64);
    let corners: Vec<Coord<f64>> = [(c, r), (c + 1.0, r), (c + 1.0, r + 1.0), (c, r + 1.0), (c, r)]
        .into_iter()
        .map(|(c, r)| {
            let (x, y) = transform.apply(c, r);
            Coord { x, y }
        })
        .collect();
    Polygon::new(LineString::from(corners), vec![])
}

impl Rasterize for GeoRasterizer {
    fn rasterize(
        &self,
        shapes: &[Geometry<f64>],
        out_shape: (usize, usize),
        transform: &GeoTransform,
        all_touched: bool,
        fill: bool,
        default_value: bool,
    ) -> Result<Array2<bool>> {
        let (rows, cols) = out_shape;
        let mut out = Array2::from_elem(out_shape, fill);
        if rows == 0 || cols == 0 {
            return Ok(out);
        }

        for shape in shapes {
            let window = geometry_window(transform, cols, rows, std::slice::from_ref(shape), 0.0, 0.0)?;
            let by_touch = all_touched || !is_areal(shape);
            trace!(?window, by_touch, "burning shape");

            for row in window.row_range() {
                for col in window.col_range() {
                    let hit = if by_touch {
                        shape.intersects(&pixel_polygon(transform, col, row))
                    } else {
                        let (x, y) = transform.pixel_center(col, row);
                        shape.contains(&Point::new(x, y))
                    };
                    if hit {
                        out[(row, col)] = default_value;
                    }
                }
            }
        }

        Ok(out)
    }
}
