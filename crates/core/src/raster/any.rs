//! Type-erased raster
//!
//! `AnyRaster` holds a `RasterArray` of any supported element kind, for
//! callers that only learn the kind at runtime (loaders, merges of
//! heterogeneous inputs). The `dispatch_anyraster!` and
//! `dispatch_datatype!` macros forward to the generic code.

use crate::crs::Crs;
use crate::error::Result;
use crate::raster::{Bounds, DataType, GeoTransform, RasterArray, RasterElement};
use ndarray::Array2;
use std::fmt;

/// A raster whose element kind is only known at runtime.
#[derive(Debug, Clone)]
pub enum AnyRaster {
    U8(RasterArray<u8>),
    U16(RasterArray<u16>),
    U32(RasterArray<u32>),
    I8(RasterArray<i8>),
    I16(RasterArray<i16>),
    I32(RasterArray<i32>),
    I64(RasterArray<i64>),
    F32(RasterArray<f32>),
    F64(RasterArray<f64>),
}

/// Evaluate `$expr` with `$r` bound to the typed raster inside an `AnyRaster`.
#[macro_export]
macro_rules! dispatch_anyraster {
    ($raster:expr, $r:ident, $expr:expr) => {
        match $raster {
            $crate::raster::AnyRaster::U8($r) => $expr,
            $crate::raster::AnyRaster::U16($r) => $expr,
            $crate::raster::AnyRaster::U32($r) => $expr,
            $crate::raster::AnyRaster::I8($r) => $expr,
            $crate::raster::AnyRaster::I16($r) => $expr,
            $crate::raster::AnyRaster::I32($r) => $expr,
            $crate::raster::AnyRaster::I64($r) => $expr,
            $crate::raster::AnyRaster::F32($r) => $expr,
            $crate::raster::AnyRaster::F64($r) => $expr,
        }
    };
}

/// Evaluate `$expr` with the type alias `$T` set to the element kind of `$dtype`.
#[macro_export]
macro_rules! dispatch_datatype {
    ($dtype:expr, $T:ident, $expr:expr) => {
        match $dtype {
            $crate::raster::DataType::U8 => {
                type $T = u8;
                $expr
            }
            $crate::raster::DataType::U16 => {
                type $T = u16;
                $expr
            }
            $crate::raster::DataType::U32 => {
                type $T = u32;
                $expr
            }
            $crate::raster::DataType::I8 => {
                type $T = i8;
                $expr
            }
            $crate::raster::DataType::I16 => {
                type $T = i16;
                $expr
            }
            $crate::raster::DataType::I32 => {
                type $T = i32;
                $expr
            }
            $crate::raster::DataType::I64 => {
                type $T = i64;
                $expr
            }
            $crate::raster::DataType::F32 => {
                type $T = f32;
                $expr
            }
            $crate::raster::DataType::F64 => {
                type $T = f64;
                $expr
            }
        }
    };
}

impl AnyRaster {
    pub fn dtype(&self) -> DataType {
        dispatch_anyraster!(self, r, r.dtype())
    }

    pub fn width(&self) -> usize {
        dispatch_anyraster!(self, r, r.width())
    }

    pub fn height(&self) -> usize {
        dispatch_anyraster!(self, r, r.height())
    }

    pub fn shape(&self) -> (usize, usize) {
        dispatch_anyraster!(self, r, r.shape())
    }

    pub fn transform(&self) -> &GeoTransform {
        dispatch_anyraster!(self, r, r.transform())
    }

    pub fn crs(&self) -> Option<&Crs> {
        dispatch_anyraster!(self, r, r.crs())
    }

    pub fn bounds(&self) -> Bounds {
        dispatch_anyraster!(self, r, r.bounds())
    }

    pub fn resolution(&self) -> (f64, f64) {
        dispatch_anyraster!(self, r, r.resolution())
    }

    /// The no-data sentinel widened to `f64`, for display and comparison
    pub fn no_data_f64(&self) -> Option<f64> {
        dispatch_anyraster!(self, r, r.no_data_value().and_then(RasterElement::as_f64))
    }

    pub fn no_data_mask(&self) -> Array2<bool> {
        dispatch_anyraster!(self, r, r.no_data_mask())
    }

    pub fn set_crs(&self, crs: impl Into<Crs>) -> Result<AnyRaster> {
        let crs = crs.into();
        dispatch_anyraster!(self, r, r.set_crs(crs).map(AnyRaster::from))
    }

    /// Cast to the element kind named by `dtype`
    pub fn astype(&self, dtype: DataType) -> Result<AnyRaster> {
        dispatch_datatype!(
            dtype,
            U,
            dispatch_anyraster!(self, r, r.astype::<U>().map(AnyRaster::from))
        )
    }

    /// The typed raster, if it holds elements of kind `T`
    pub fn as_typed<T: RasterElement>(&self) -> Option<&RasterArray<T>> {
        T::from_any(self)
    }
}

impl<T: RasterElement> From<RasterArray<T>> for AnyRaster {
    fn from(raster: RasterArray<T>) -> Self {
        T::into_any(raster)
    }
}

impl fmt::Display for AnyRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch_anyraster!(self, r, fmt::Display::fmt(r, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::NoData;
    use ndarray::array;

    fn sample() -> AnyRaster {
        RasterArray::new(
            array![[1i16, -9999], [3, 4]],
            GeoTransform::new(0.0, 2.0, 1.0, -1.0),
            None,
            NoData::Value(-9999i16),
        )
        .into()
    }

    #[test]
    fn test_dtype_and_metadata() {
        let any = sample();
        assert_eq!(any.dtype(), DataType::I16);
        assert_eq!(any.shape(), (2, 2));
        assert_eq!(any.no_data_f64(), Some(-9999.0));
        assert_eq!(any.no_data_mask(), array![[false, true], [false, false]]);
    }

    #[test]
    fn test_astype() {
        let any = sample().astype(DataType::F32).unwrap();
        assert_eq!(any.dtype(), DataType::F32);
        let typed = any.as_typed::<f32>().unwrap();
        assert_eq!(typed.data()[(1, 0)], 3.0);
        assert!(any.as_typed::<i16>().is_none());
        assert!(sample().astype(DataType::U8).is_err());
    }

    #[test]
    fn test_set_crs() {
        let any = sample().set_crs(Crs::wgs84()).unwrap();
        assert_eq!(any.crs(), Some(&Crs::wgs84()));
    }
}
