//! Elementwise raster algebra
//!
//! Every arithmetic, comparison or logical operation on a [`RasterArray`]
//! goes through [`dispatch`]: operands are checked for compatible
//! georeferencing, the union of their no-data masks is computed first, and
//! masked cells of the result are overwritten with the left operand's
//! sentinel.
//!
//! Operations a given element kind does not define (bitwise ops on
//! floats, negation of unsigned values) are not errors at this level: they
//! yield [`Dispatch::NotImplemented`] and leave the decision to the caller.
//! The `std::ops` overloads in [`overload`] turn that into
//! [`Error::Unsupported`].

mod dispatch;
mod overload;

pub use dispatch::{
    apply_binary, apply_binary_into, apply_binary_reflected, apply_named, apply_unary, reduce,
    reduce_named,
};

use crate::error::{Error, Result};
use crate::raster::{DataType, RasterArray, RasterElement};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<T> {
    Done(T),
    /// The operation is not defined for these operands
    NotImplemented,
}

impl<T> Dispatch<T> {
    pub fn is_implemented(&self) -> bool {
        matches!(self, Dispatch::Done(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Dispatch::Done(v) => Some(v),
            Dispatch::NotImplemented => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Dispatch<U> {
        match self {
            Dispatch::Done(v) => Dispatch::Done(f(v)),
            Dispatch::NotImplemented => Dispatch::NotImplemented,
        }
    }

    /// Turn `NotImplemented` into `Error::Unsupported` naming `what`
    pub fn into_result(self, what: impl fmt::Display) -> Result<T> {
        match self {
            Dispatch::Done(v) => Ok(v),
            Dispatch::NotImplemented => Err(Error::Unsupported(format!("{} is not implemented", what))),
        }
    }
}

/// Right-hand side of a binary operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a, T: RasterElement> {
    Raster(&'a RasterArray<T>),
    Scalar(T),
    /// Bare array; must match the raster's shape and carries no no-data
    Array(ArrayView2<'a, T>),
}

impl<'a, T: RasterElement> From<&'a RasterArray<T>> for Operand<'a, T> {
    fn from(raster: &'a RasterArray<T>) -> Self {
        Operand::Raster(raster)
    }
}

impl<'a, T: RasterElement> From<ArrayView2<'a, T>> for Operand<'a, T> {
    fn from(array: ArrayView2<'a, T>) -> Self {
        Operand::Array(array)
    }
}

/// Result of a reduction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reduced<T> {
    Value(T),
    Bool(bool),
    /// Extremum requested but every cell is no-data
    Empty,
}

macro_rules! op_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical name
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $canonical),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($canonical $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(Error::Unsupported(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        s
                    ))),
                }
            }
        }
    };
}

op_enum! {
    /// Elementwise binary operations
    BinaryOp {
        Add => "add",
        Sub => "sub" | "subtract",
        Mul => "mul" | "multiply",
        Div => "div" | "divide" | "true_divide",
        FloorDiv => "floordiv" | "floor_divide",
        Rem => "mod" | "remainder",
        Pow => "pow" | "power",
        Eq => "eq" | "equal",
        Ne => "ne" | "not_equal",
        Lt => "lt" | "less",
        Le => "le" | "less_equal",
        Gt => "gt" | "greater",
        Ge => "ge" | "greater_equal",
        And => "and" | "logical_and" | "bitwise_and",
        Or => "or" | "logical_or" | "bitwise_or",
        Xor => "xor" | "logical_xor" | "bitwise_xor",
    }
}

op_enum! {
    /// Elementwise unary operations
    UnaryOp {
        Neg => "neg" | "negative",
        Pos => "pos" | "positive",
        Abs => "abs" | "absolute",
        Not => "not" | "invert" | "logical_not",
    }
}

op_enum! {
    /// Whole-raster reductions over valid cells
    ReduceOp {
        Sum => "sum",
        Prod => "prod" | "product",
        Min => "min" | "minimum" | "amin",
        Max => "max" | "maximum" | "amax",
        All => "all",
        Any => "any",
    }
}

impl BinaryOp {
    /// Whether the operation is defined for elements of `dtype`
    pub fn is_defined_for(&self, dtype: DataType) -> bool {
        match self {
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => !dtype.is_float(),
            _ => true,
        }
    }

    /// Comparisons produce 1/0 in the operand kind
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub(crate) fn eval<T: RasterElement>(&self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a.elem_add(b),
            BinaryOp::Sub => a.elem_sub(b),
            BinaryOp::Mul => a.elem_mul(b),
            BinaryOp::Div => a.elem_div(b),
            BinaryOp::FloorDiv => a.elem_floor_div(b),
            BinaryOp::Rem => a.elem_rem(b),
            BinaryOp::Pow => a.elem_pow(b),
            BinaryOp::Eq => T::from_bool(a == b),
            BinaryOp::Ne => T::from_bool(a != b),
            BinaryOp::Lt => T::from_bool(a < b),
            BinaryOp::Le => T::from_bool(a <= b),
            BinaryOp::Gt => T::from_bool(a > b),
            BinaryOp::Ge => T::from_bool(a >= b),
            BinaryOp::And => a.elem_bitand(b).unwrap_or_else(T::zero),
            BinaryOp::Or => a.elem_bitor(b).unwrap_or_else(T::zero),
            BinaryOp::Xor => a.elem_bitxor(b).unwrap_or_else(T::zero),
        }
    }
}

impl UnaryOp {
    /// Whether the operation is defined for elements of `dtype`
    pub fn is_defined_for(&self, dtype: DataType) -> bool {
        match self {
            UnaryOp::Neg => dtype.is_signed(),
            _ => true,
        }
    }

    pub(crate) fn eval<T: RasterElement>(&self, a: T) -> T {
        match self {
            UnaryOp::Neg => a.elem_neg().unwrap_or(a),
            UnaryOp::Pos => a,
            UnaryOp::Abs => a.elem_abs(),
            UnaryOp::Not => T::from_bool(!a.is_truthy()),
        }
    }
}
