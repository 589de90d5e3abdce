//! Operator overloading for rasters
//!
//! `&a + &b`, `&a * 2.0` and `2.0 * &a` all route through the dispatcher
//! and return `Result<RasterArray<T>>`: incompatible operands surface as
//! `IncompatibleOperands`, operations the element kind lacks as
//! `Unsupported`.

use super::{apply_binary, apply_binary_reflected, apply_unary, BinaryOp, Operand, UnaryOp};
use crate::error::Result;
use crate::raster::{RasterArray, RasterElement};
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

fn binary<T: RasterElement>(op: BinaryOp, lhs: &RasterArray<T>, rhs: Operand<'_, T>) -> Result<RasterArray<T>> {
    apply_binary(op, lhs, rhs)?.into_result(format_args!("{} on {}", op, T::DTYPE))
}

fn unary<T: RasterElement>(op: UnaryOp, raster: &RasterArray<T>) -> Result<RasterArray<T>> {
    apply_unary(op, raster)?.into_result(format_args!("{} on {}", op, T::DTYPE))
}

macro_rules! impl_raster_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<'b, T: RasterElement> $trait<&'b RasterArray<T>> for &RasterArray<T> {
            type Output = Result<RasterArray<T>>;

            fn $method(self, rhs: &'b RasterArray<T>) -> Self::Output {
                binary($op, self, Operand::Raster(rhs))
            }
        }
    };
}

macro_rules! impl_scalar_operator {
    ($t:ty; $($trait:ident, $method:ident, $op:expr);+ $(;)?) => {
        $(
            impl $trait<$t> for &RasterArray<$t> {
                type Output = Result<RasterArray<$t>>;

                fn $method(self, rhs: $t) -> Self::Output {
                    binary($op, self, Operand::Scalar(rhs))
                }
            }

            impl $trait<&RasterArray<$t>> for $t {
                type Output = Result<RasterArray<$t>>;

                fn $method(self, rhs: &RasterArray<$t>) -> Self::Output {
                    apply_binary_reflected($op, self, rhs)?
                        .into_result(format_args!("{} on {}", $op, <$t as RasterElement>::DTYPE))
                }
            }
        )+
    };
}

macro_rules! impl_scalar_operators {
    ($($t:ty),+) => {
        $(
            impl_scalar_operator!($t;
                Add, add, BinaryOp::Add;
                Sub, sub, BinaryOp::Sub;
                Mul, mul, BinaryOp::Mul;
                Div, div, BinaryOp::Div;
                Rem, rem, BinaryOp::Rem;
                BitAnd, bitand, BinaryOp::And;
                BitOr, bitor, BinaryOp::Or;
                BitXor, bitxor, BinaryOp::Xor;
            );
        )+
    };
}

impl_raster_operator!(Add, add, BinaryOp::Add);
impl_raster_operator!(Sub, sub, BinaryOp::Sub);
impl_raster_operator!(Mul, mul, BinaryOp::Mul);
impl_raster_operator!(Div, div, BinaryOp::Div);
impl_raster_operator!(Rem, rem, BinaryOp::Rem);
impl_raster_operator!(BitAnd, bitand, BinaryOp::And);
impl_raster_operator!(BitOr, bitor, BinaryOp::Or);
impl_raster_operator!(BitXor, bitxor, BinaryOp::Xor);

impl_scalar_operators!(u8, u16, u32, i8, i16, i32, i64, f32, f64);

impl<T: RasterElement> Neg for &RasterArray<T> {
    type Output = Result<RasterArray<T>>;

    fn neg(self) -> Self::Output {
        unary(UnaryOp::Neg, self)
    }
}

impl<T: RasterElement> Not for &RasterArray<T> {
    type Output = Result<RasterArray<T>>;

    fn not(self) -> Self::Output {
        unary(UnaryOp::Not, self)
    }
}

/// Named forms of the operations without an operator symbol
impl<T: RasterElement> RasterArray<T> {
    pub fn pow<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::Pow, self, rhs.into())
    }

    pub fn floor_div<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::FloorDiv, self, rhs.into())
    }

    /// 1 where the operands are equal, 0 elsewhere
    pub fn elem_eq<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::Eq, self, rhs.into())
    }

    pub fn elem_ne<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::Ne, self, rhs.into())
    }

    pub fn elem_lt<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::Lt, self, rhs.into())
    }

    pub fn elem_le<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::Le, self, rhs.into())
    }

    pub fn elem_gt<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::Gt, self, rhs.into())
    }

    pub fn elem_ge<'a>(&self, rhs: impl Into<Operand<'a, T>>) -> Result<Self>
    where
        T: 'a,
    {
        binary(BinaryOp::Ge, self, rhs.into())
    }

    pub fn abs(&self) -> Result<Self> {
        unary(UnaryOp::Abs, self)
    }
}
