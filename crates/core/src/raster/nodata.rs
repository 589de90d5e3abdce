//! No-data policy

use crate::error::{Error, Result};
use crate::raster::RasterElement;
use ndarray::{Array2, ArrayView2, Zip};
use std::fmt;

/// Sentinel marking cells without a valid measurement.
///
/// `Unset` is distinct from every real value: its mask is all-false.
/// A `Value` sentinel masks cells according to its kind, see
/// [`RasterElement::matches_nodata`].
#[derive(Debug, Clone, Copy, Default)]
pub enum NoData<T> {
    #[default]
    Unset,
    Value(T),
}

impl<T: RasterElement> NoData<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, NoData::Value(_))
    }

    pub fn value(&self) -> Option<T> {
        match *self {
            NoData::Unset => None,
            NoData::Value(v) => Some(v),
        }
    }

    /// Whether a single value is flagged as no-data
    pub fn is_nodata(&self, value: T) -> bool {
        match *self {
            NoData::Unset => false,
            NoData::Value(nd) => value.matches_nodata(nd),
        }
    }

    /// Boolean mask, `true` where `data` holds no-data
    pub fn mask(&self, data: ArrayView2<'_, T>) -> Array2<bool> {
        match *self {
            NoData::Unset => Array2::from_elem(data.dim(), false),
            NoData::Value(nd) => data.mapv(|v| v.matches_nodata(nd)),
        }
    }

    /// Like [`NoData::mask`] but with near-equality for floating sentinels.
    ///
    /// Used on buffers that went through arithmetic, where an exact match
    /// cannot be relied upon.
    pub fn mask_close(&self, data: ArrayView2<'_, T>) -> Array2<bool> {
        match *self {
            NoData::Unset => Array2::from_elem(data.dim(), false),
            NoData::Value(nd) if nd.is_nan() || nd.is_infinite() => self.mask(data),
            NoData::Value(nd) => data.mapv(|v| v.is_close(nd)),
        }
    }

    /// Policy equality: both unset, or both set to the same sentinel.
    pub fn equals(&self, other: &NoData<T>) -> bool {
        match (self, other) {
            (NoData::Unset, NoData::Unset) => true,
            (NoData::Value(a), NoData::Value(b)) => a.same_sentinel(*b),
            _ => false,
        }
    }

    /// Copy of `data` with every no-data cell replaced by `new_value`.
    pub fn apply_new_value(&self, data: ArrayView2<'_, T>, new_value: T) -> Array2<T> {
        let mut out = data.to_owned();
        if let NoData::Value(nd) = *self {
            out.mapv_inplace(|v| if v.matches_nodata(nd) { new_value } else { v });
        }
        out
    }

    /// Overwrite the cells flagged in `mask` with this sentinel.
    ///
    /// No-op when unset.
    pub fn fill_masked(&self, data: &mut Array2<T>, mask: &Array2<bool>) {
        if let NoData::Value(nd) = *self {
            Zip::from(data).and(mask).for_each(|v, &m| {
                if m {
                    *v = nd;
                }
            });
        }
    }

    /// Re-express the sentinel in another element kind.
    pub fn cast<U: RasterElement>(&self) -> Result<NoData<U>> {
        match *self {
            NoData::Unset => Ok(NoData::Unset),
            NoData::Value(v) => cast_value::<T, U>(v).map(NoData::Value),
        }
    }
}

/// Numeric cast that fails instead of saturating: NaN, infinities and
/// out-of-range values have no representation in the target kind.
pub(crate) fn cast_value<T: RasterElement, U: RasterElement>(value: T) -> Result<U> {
    num_traits::cast::<T, U>(value).ok_or_else(|| Error::InvalidCast {
        value: value.to_string(),
        dtype: U::DTYPE.name(),
    })
}

impl<T: RasterElement> PartialEq for NoData<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<T: RasterElement> From<Option<T>> for NoData<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => NoData::Value(v),
            None => NoData::Unset,
        }
    }
}

impl<T: RasterElement> fmt::Display for NoData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoData::Unset => f.write_str("None"),
            NoData::Value(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_unset_mask_is_all_false() {
        let data = array![[1.0, f64::NAN], [3.0, 4.0]];
        let mask = NoData::<f64>::Unset.mask(data.view());
        assert!(mask.iter().all(|&m| !m));
    }

    #[test]
    fn test_nan_mask() {
        let data = array![[1.0, f64::NAN], [f64::NAN, 4.0]];
        let mask = NoData::Value(f64::NAN).mask(data.view());
        assert_eq!(mask, array![[false, true], [true, false]]);
    }

    #[test]
    fn test_infinity_mask_matches_both_signs() {
        let data = array![[f64::INFINITY, f64::NEG_INFINITY, 0.0]];
        let mask = NoData::Value(f64::INFINITY).mask(data.view());
        assert_eq!(mask, array![[true, true, false]]);
    }

    #[test]
    fn test_finite_mask() {
        let data = array![[-1, 2], [3, -1]];
        let mask = NoData::Value(-1).mask(data.view());
        assert_eq!(mask, array![[true, false], [false, true]]);
    }

    #[test]
    fn test_policy_equality() {
        assert!(NoData::<f32>::Unset.equals(&NoData::Unset));
        assert!(!NoData::<f32>::Unset.equals(&NoData::Value(0.0)));
        assert!(NoData::Value(f32::NAN).equals(&NoData::Value(f32::NAN)));
        assert!(!NoData::Value(f32::INFINITY).equals(&NoData::Value(f32::NEG_INFINITY)));
        assert!(NoData::Value(-9999i16).equals(&NoData::Value(-9999)));
    }

    #[test]
    fn test_apply_new_value() {
        let data = array![[-1, 2], [3, -1]];
        let out = NoData::Value(-1).apply_new_value(data.view(), 0);
        assert_eq!(out, array![[0, 2], [3, 0]]);
        // input untouched
        assert_eq!(data[(0, 0)], -1);
    }

    #[test]
    fn test_cast() {
        assert_eq!(NoData::Value(-1i32).cast::<f64>().unwrap(), NoData::Value(-1.0));
        assert!(NoData::Value(f64::NAN).cast::<u8>().is_err());
        assert!(NoData::Value(-1i32).cast::<u8>().is_err());
    }
}
