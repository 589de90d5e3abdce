//! Raster element trait for generic cell values

use crate::raster::{AnyRaster, RasterArray};
use num_traits::{Num, NumCast};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

/// The closed set of numeric kinds a raster buffer can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    pub fn is_signed(&self) -> bool {
        !matches!(self, DataType::U8 | DataType::U16 | DataType::U32)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for types that can be stored in a raster cell.
///
/// Besides the numeric bounds this carries the per-kind behaviour the
/// rest of the crate relies on: no-data comparison (exact for integers,
/// NaN/infinity aware for floats) and the elementwise kernels used by
/// [`crate::ops`]. Integer kernels wrap on overflow and map division by
/// zero to zero instead of panicking.
pub trait RasterElement:
    Copy + Clone + Debug + Display + PartialOrd + PartialEq + Num + NumCast + Send + Sync + 'static
{
    /// Kind tag of this type
    const DTYPE: DataType;

    /// Minimum value representable by this type
    fn min_value() -> Self;

    /// Maximum value representable by this type
    fn max_value() -> Self;

    /// Default no-data value for this type
    fn default_nodata() -> Self;

    fn is_nan(self) -> bool;

    fn is_infinite(self) -> bool;

    /// Whether `self` is flagged by the sentinel `nodata`.
    ///
    /// A NaN sentinel matches any NaN, an infinite sentinel matches any
    /// infinity, anything else matches by equality.
    fn matches_nodata(self, nodata: Self) -> bool;

    /// Sentinel identity: NaN equals NaN, infinities compare with sign.
    fn same_sentinel(self, other: Self) -> bool;

    /// Near-equality (`numpy.isclose` tolerances) for floats, exact for integers.
    fn is_close(self, other: Self) -> bool;

    /// Truth value used by logical operators and `all`/`any`.
    fn is_truthy(self) -> bool {
        self != Self::zero()
    }

    fn from_bool(value: bool) -> Self {
        if value {
            Self::one()
        } else {
            Self::zero()
        }
    }

    fn elem_add(self, rhs: Self) -> Self;
    fn elem_sub(self, rhs: Self) -> Self;
    fn elem_mul(self, rhs: Self) -> Self;
    fn elem_div(self, rhs: Self) -> Self;
    /// Division rounded towards negative infinity
    fn elem_floor_div(self, rhs: Self) -> Self;
    /// Remainder taking the sign of the divisor
    fn elem_rem(self, rhs: Self) -> Self;
    fn elem_pow(self, rhs: Self) -> Self;
    fn elem_abs(self) -> Self;
    /// `None` for unsigned kinds
    fn elem_neg(self) -> Option<Self>;
    /// `None` for floating kinds
    fn elem_bitand(self, rhs: Self) -> Option<Self>;
    fn elem_bitor(self, rhs: Self) -> Option<Self>;
    fn elem_bitxor(self, rhs: Self) -> Option<Self>;

    /// Widen to f64, `None` when the value has no f64 representation
    fn as_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert from f64, rounding to nearest for integer kinds
    fn from_f64(value: f64) -> Option<Self> {
        if Self::DTYPE.is_float() {
            NumCast::from(value)
        } else {
            NumCast::from(value.round())
        }
    }

    /// Move a typed raster into the type-erased sum type
    fn into_any(raster: RasterArray<Self>) -> AnyRaster;

    /// Borrow the typed raster back out of the sum type
    fn from_any(raster: &AnyRaster) -> Option<&RasterArray<Self>>;
}

macro_rules! impl_int_common {
    ($t:ty, $dtype:ident) => {
        const DTYPE: DataType = DataType::$dtype;

        fn min_value() -> Self {
            <$t>::MIN
        }

        fn max_value() -> Self {
            <$t>::MAX
        }

        fn default_nodata() -> Self {
            <$t>::MIN
        }

        fn is_nan(self) -> bool {
            false
        }

        fn is_infinite(self) -> bool {
            false
        }

        fn matches_nodata(self, nodata: Self) -> bool {
            self == nodata
        }

        fn same_sentinel(self, other: Self) -> bool {
            self == other
        }

        fn is_close(self, other: Self) -> bool {
            self == other
        }

        fn elem_add(self, rhs: Self) -> Self {
            self.wrapping_add(rhs)
        }

        fn elem_sub(self, rhs: Self) -> Self {
            self.wrapping_sub(rhs)
        }

        fn elem_mul(self, rhs: Self) -> Self {
            self.wrapping_mul(rhs)
        }

        fn elem_div(self, rhs: Self) -> Self {
            self.checked_div(rhs).unwrap_or(0)
        }

        fn elem_floor_div(self, rhs: Self) -> Self {
            match (self.checked_div(rhs), self.checked_rem(rhs)) {
                (Some(q), Some(r)) if r != 0 && ((r < 0) != (rhs < 0)) => q.wrapping_sub(1),
                (Some(q), _) => q,
                (None, _) => 0,
            }
        }

        fn elem_rem(self, rhs: Self) -> Self {
            match self.checked_rem(rhs) {
                Some(r) if r != 0 && ((r < 0) != (rhs < 0)) => r.wrapping_add(rhs),
                Some(r) => r,
                None => 0,
            }
        }

        fn elem_pow(self, rhs: Self) -> Self {
            match u32::try_from(rhs) {
                Ok(exp) => self.wrapping_pow(exp),
                // negative exponents truncate towards zero
                Err(_) if rhs < (0 as $t) => match self {
                    1 => 1,
                    _ if self == (0 as $t).wrapping_sub(1) => {
                        if rhs % 2 == 0 { 1 } else { self }
                    }
                    _ => 0,
                },
                Err(_) => 0,
            }
        }

        fn elem_bitand(self, rhs: Self) -> Option<Self> {
            Some(self & rhs)
        }

        fn elem_bitor(self, rhs: Self) -> Option<Self> {
            Some(self | rhs)
        }

        fn elem_bitxor(self, rhs: Self) -> Option<Self> {
            Some(self ^ rhs)
        }

        fn into_any(raster: RasterArray<Self>) -> AnyRaster {
            AnyRaster::$dtype(raster)
        }

        fn from_any(raster: &AnyRaster) -> Option<&RasterArray<Self>> {
            match raster {
                AnyRaster::$dtype(r) => Some(r),
                _ => None,
            }
        }
    };
}

macro_rules! impl_raster_element_signed {
    ($t:ty, $dtype:ident) => {
        impl RasterElement for $t {
            impl_int_common!($t, $dtype);

            fn elem_abs(self) -> Self {
                self.wrapping_abs()
            }

            fn elem_neg(self) -> Option<Self> {
                Some(self.wrapping_neg())
            }
        }
    };
}

macro_rules! impl_raster_element_unsigned {
    ($t:ty, $dtype:ident) => {
        impl RasterElement for $t {
            impl_int_common!($t, $dtype);

            fn elem_abs(self) -> Self {
                self
            }

            fn elem_neg(self) -> Option<Self> {
                None
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty, $dtype:ident) => {
        impl RasterElement for $t {
            const DTYPE: DataType = DataType::$dtype;

            fn min_value() -> Self {
                <$t>::MIN
            }

            fn max_value() -> Self {
                <$t>::MAX
            }

            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            fn is_infinite(self) -> bool {
                <$t>::is_infinite(self)
            }

            fn matches_nodata(self, nodata: Self) -> bool {
                if nodata.is_nan() {
                    <$t>::is_nan(self)
                } else if nodata.is_infinite() {
                    <$t>::is_infinite(self)
                } else {
                    self == nodata
                }
            }

            fn same_sentinel(self, other: Self) -> bool {
                (<$t>::is_nan(self) && <$t>::is_nan(other)) || self == other
            }

            fn is_close(self, other: Self) -> bool {
                if <$t>::is_nan(self) || <$t>::is_nan(other) {
                    return <$t>::is_nan(self) && <$t>::is_nan(other);
                }
                if self == other {
                    return true;
                }
                (self - other).abs() <= 1e-8 + 1e-5 * other.abs()
            }

            fn elem_add(self, rhs: Self) -> Self {
                self + rhs
            }

            fn elem_sub(self, rhs: Self) -> Self {
                self - rhs
            }

            fn elem_mul(self, rhs: Self) -> Self {
                self * rhs
            }

            fn elem_div(self, rhs: Self) -> Self {
                self / rhs
            }

            fn elem_floor_div(self, rhs: Self) -> Self {
                (self / rhs).floor()
            }

            fn elem_rem(self, rhs: Self) -> Self {
                let r = self % rhs;
                if r != 0.0 && ((r < 0.0) != (rhs < 0.0)) {
                    r + rhs
                } else {
                    r
                }
            }

            fn elem_pow(self, rhs: Self) -> Self {
                self.powf(rhs)
            }

            fn elem_abs(self) -> Self {
                self.abs()
            }

            fn elem_neg(self) -> Option<Self> {
                Some(-self)
            }

            fn elem_bitand(self, _rhs: Self) -> Option<Self> {
                None
            }

            fn elem_bitor(self, _rhs: Self) -> Option<Self> {
                None
            }

            fn elem_bitxor(self, _rhs: Self) -> Option<Self> {
                None
            }

            fn into_any(raster: RasterArray<Self>) -> AnyRaster {
                AnyRaster::$dtype(raster)
            }

            fn from_any(raster: &AnyRaster) -> Option<&RasterArray<Self>> {
                match raster {
                    AnyRaster::$dtype(r) => Some(r),
                    _ => None,
                }
            }
        }
    };
}

impl_raster_element_unsigned!(u8, U8);
impl_raster_element_unsigned!(u16, U16);
impl_raster_element_unsigned!(u32, U32);
impl_raster_element_signed!(i8, I8);
impl_raster_element_signed!(i16, I16);
impl_raster_element_signed!(i32, I32);
impl_raster_element_signed!(i64, I64);
impl_raster_element_float!(f32, F32);
impl_raster_element_float!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodata_matching_per_kind() {
        assert!(f64::NAN.matches_nodata(f64::NAN));
        assert!(f64::NEG_INFINITY.matches_nodata(f64::INFINITY));
        assert!(!f64::NEG_INFINITY.same_sentinel(f64::INFINITY));
        assert!(f64::NAN.same_sentinel(f64::NAN));
        assert!((-1i32).matches_nodata(-1));
        assert!(!0i32.matches_nodata(-1));
    }

    #[test]
    fn test_is_close() {
        assert!(1.0f64.is_close(1.0 + 1e-9));
        assert!(!1.0f64.is_close(1.001));
        assert!(!5u8.is_close(6));
    }

    #[test]
    fn test_integer_kernels_do_not_panic() {
        assert_eq!(7i32.elem_div(0), 0);
        assert_eq!(7i32.elem_rem(0), 0);
        assert_eq!(255u8.elem_add(1), 0);
        assert_eq!((-7i32).elem_floor_div(2), -4);
        assert_eq!((-7i32).elem_rem(3), 2);
        assert_eq!(2i32.elem_pow(-1), 0);
        assert_eq!((-1i32).elem_pow(-3), -1);
        assert_eq!(3u16.elem_neg(), None);
    }

    #[test]
    fn test_float_kernels() {
        assert_eq!((-7.0f64).elem_floor_div(2.0), -4.0);
        assert_eq!((-7.0f64).elem_rem(3.0), 2.0);
        assert_eq!(1.5f32.elem_bitand(1.0), None);
    }

    #[test]
    fn test_dtype() {
        assert_eq!(<f32 as RasterElement>::DTYPE, DataType::F32);
        assert!(DataType::F64.is_float());
        assert!(!DataType::U16.is_signed());
        assert_eq!(DataType::I16.to_string(), "i16");
    }
}
