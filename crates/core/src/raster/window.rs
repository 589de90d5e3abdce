//! Pixel-space windows

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An axis-aligned rectangle of pixels: offset plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn new(col_off: usize, row_off: usize, width: usize, height: usize) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// The window covering a whole `width x height` raster
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn row_range(&self) -> Range<usize> {
        self.row_off..self.row_off + self.height
    }

    pub fn col_range(&self) -> Range<usize> {
        self.col_off..self.col_off + self.width
    }

    /// Overlap of two windows. Disjoint windows give a zero-size window.
    pub fn intersection(&self, other: &Window) -> Window {
        SignedWindow::from(*self).clamp_to(other)
    }
}

/// Window whose offsets may lie left of / above the raster, as produced
/// while mapping geometry envelopes into pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SignedWindow {
    pub col_off: i64,
    pub row_off: i64,
    pub width: i64,
    pub height: i64,
}

impl SignedWindow {
    pub fn from_extent(col_start: i64, row_start: i64, col_stop: i64, row_stop: i64) -> Self {
        Self {
            col_off: col_start,
            row_off: row_start,
            width: col_stop.saturating_sub(col_start).max(0),
            height: row_stop.saturating_sub(row_start).max(0),
        }
    }

    /// Intersect with `bounds`, never failing.
    pub fn clamp_to(&self, bounds: &Window) -> Window {
        let (b_c0, b_r0) = (bounds.col_off as i64, bounds.row_off as i64);
        let (b_c1, b_r1) = (b_c0 + bounds.width as i64, b_r0 + bounds.height as i64);

        let c0 = self.col_off.clamp(b_c0, b_c1);
        let r0 = self.row_off.clamp(b_r0, b_r1);
        let c1 = self.col_off.saturating_add(self.width).clamp(c0, b_c1);
        let r1 = self.row_off.saturating_add(self.height).clamp(r0, b_r1);

        Window::new(c0 as usize, r0 as usize, (c1 - c0) as usize, (r1 - r0) as usize)
    }
}

impl From<Window> for SignedWindow {
    fn from(w: Window) -> Self {
        Self {
            col_off: w.col_off as i64,
            row_off: w.row_off as i64,
            width: w.width as i64,
            height: w.height as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_overlap() {
        let a = Window::new(2, 2, 10, 10);
        let b = Window::full(8, 6);
        assert_eq!(a.intersection(&b), Window::new(2, 2, 6, 4));
    }

    #[test]
    fn test_intersection_disjoint_is_empty() {
        let a = Window::new(20, 0, 5, 5);
        let b = Window::full(10, 10);
        let w = a.intersection(&b);
        assert!(w.is_empty());
        assert_eq!(w.width, 0);
    }

    #[test]
    fn test_signed_window_clamps_negative_offsets() {
        let w = SignedWindow::from_extent(-3, -1, 4, 2).clamp_to(&Window::full(10, 10));
        assert_eq!(w, Window::new(0, 0, 4, 2));
    }

    #[test]
    fn test_signed_window_extreme_extent() {
        let w = SignedWindow::from_extent(-5, -5, i64::MAX, i64::MAX).clamp_to(&Window::full(10, 10));
        assert_eq!(w, Window::full(10, 10));
    }
}
