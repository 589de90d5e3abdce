//! Elementwise dispatcher
//!
//! Kernels run row by row over the left operand, in parallel when the
//! `parallel` feature is enabled.

use super::{BinaryOp, Dispatch, Operand, ReduceOp, Reduced, UnaryOp};
use crate::error::{Error, Result};
use crate::maybe_rayon::*;
use crate::raster::{RasterArray, RasterElement};
use ndarray::{Array2, ArrayView2, Zip};
use tracing::trace;

/// Right-hand values as seen by a kernel
enum Rhs<'a, T> {
    Grid(ArrayView2<'a, T>),
    Scalar(T),
}

impl<T: Copy> Rhs<'_, T> {
    #[inline]
    fn at(&self, row: usize, col: usize) -> T {
        match self {
            Rhs::Grid(v) => v[(row, col)],
            Rhs::Scalar(s) => *s,
        }
    }
}

/// Validate `rhs` against `lhs` and return its values together with the
/// union of both no-data masks.
fn prepare<'a, T: RasterElement>(
    lhs: &RasterArray<T>,
    rhs: &Operand<'a, T>,
) -> Result<(Rhs<'a, T>, Array2<bool>)> {
    let mut mask = lhs.no_data_mask();
    let values = match *rhs {
        Operand::Raster(other) => {
            lhs.check_compatible(other)?;
            Zip::from(&mut mask)
                .and(&other.no_data_mask())
                .for_each(|m, &o| *m |= o);
            Rhs::Grid(other.data())
        }
        Operand::Array(view) => {
            if view.dim() != lhs.shape() {
                return Err(Error::IncompatibleOperands {
                    property: "shape",
                    detail: format!("{:?} vs {:?}", lhs.shape(), view.dim()),
                });
            }
            Rhs::Grid(view)
        }
        Operand::Scalar(s) => Rhs::Scalar(s),
    };
    Ok((values, mask))
}

fn binary_kernel<T: RasterElement>(
    op: BinaryOp,
    lhs: ArrayView2<'_, T>,
    rhs: &Rhs<'_, T>,
    reflected: bool,
) -> Result<Array2<T>> {
    let (rows, cols) = lhs.dim();

    let data: Vec<T> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                let a = lhs[(row, col)];
                let b = rhs.at(row, col);
                row_data.push(if reflected { op.eval(b, a) } else { op.eval(a, b) });
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
}

/// Overwrite masked cells with the left operand's sentinel and wrap the
/// buffer in the left operand's metadata.
fn finish<T: RasterElement>(
    lhs: &RasterArray<T>,
    mut data: Array2<T>,
    mask: &Array2<bool>,
) -> RasterArray<T> {
    lhs.no_data().fill_masked(&mut data, mask);
    lhs.derive(data)
}

/// `lhs <op> rhs`
pub fn apply_binary<T: RasterElement>(
    op: BinaryOp,
    lhs: &RasterArray<T>,
    rhs: Operand<'_, T>,
) -> Result<Dispatch<RasterArray<T>>> {
    if !op.is_defined_for(T::DTYPE) {
        trace!(%op, dtype = %T::DTYPE, "binary op not implemented");
        return Ok(Dispatch::NotImplemented);
    }
    let (values, mask) = prepare(lhs, &rhs)?;
    let data = binary_kernel(op, lhs.data(), &values, false)?;
    Ok(Dispatch::Done(finish(lhs, data, &mask)))
}

/// `scalar <op> raster`, the reflected form of a binary operation.
///
/// The raster still provides the metadata of the result.
pub fn apply_binary_reflected<T: RasterElement>(
    op: BinaryOp,
    scalar: T,
    raster: &RasterArray<T>,
) -> Result<Dispatch<RasterArray<T>>> {
    if !op.is_defined_for(T::DTYPE) {
        return Ok(Dispatch::NotImplemented);
    }
    let mask = raster.no_data_mask();
    let data = binary_kernel(op, raster.data(), &Rhs::Scalar(scalar), true)?;
    Ok(Dispatch::Done(finish(raster, data, &mask)))
}

/// `<op> raster`
pub fn apply_unary<T: RasterElement>(
    op: UnaryOp,
    raster: &RasterArray<T>,
) -> Result<Dispatch<RasterArray<T>>> {
    if !op.is_defined_for(T::DTYPE) {
        trace!(%op, dtype = %T::DTYPE, "unary op not implemented");
        return Ok(Dispatch::NotImplemented);
    }
    let (rows, cols) = raster.shape();
    let view = raster.data();

    let data: Vec<T> = (0..rows)
        .into_par_iter()
        .flat_map(|row| (0..cols).map(|col| op.eval(view[(row, col)])).collect::<Vec<_>>())
        .collect();
    let data = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(Dispatch::Done(finish(raster, data, &raster.no_data_mask())))
}

/// `lhs <op> rhs` written into an explicit destination.
///
/// Only cells where `where_mask` is `true` (all cells when `None`) are
/// written; the rest of `out` keeps its prior content. Masked result cells
/// carry the left operand's no-data sentinel as usual.
pub fn apply_binary_into<T: RasterElement>(
    op: BinaryOp,
    lhs: &RasterArray<T>,
    rhs: Operand<'_, T>,
    out: &mut Array2<T>,
    where_mask: Option<ArrayView2<'_, bool>>,
) -> Result<Dispatch<()>> {
    if out.dim() != lhs.shape() {
        return Err(Error::IncompatibleOperands {
            property: "output shape",
            detail: format!("{:?} vs {:?}", lhs.shape(), out.dim()),
        });
    }
    if let Some(w) = &where_mask {
        if w.dim() != lhs.shape() {
            return Err(Error::IncompatibleOperands {
                property: "where shape",
                detail: format!("{:?} vs {:?}", lhs.shape(), w.dim()),
            });
        }
    }

    let result = match apply_binary(op, lhs, rhs)? {
        Dispatch::Done(r) => r,
        Dispatch::NotImplemented => return Ok(Dispatch::NotImplemented),
    };

    match where_mask {
        Some(w) => Zip::from(out)
            .and(&result.data())
            .and(&w)
            .for_each(|o, &v, &keep| {
                if keep {
                    *o = v;
                }
            }),
        None => out.assign(&result.data()),
    }
    Ok(Dispatch::Done(()))
}

/// Resolve an operation by name and apply it.
///
/// With `rhs` the name must be a binary operation, without it a unary
/// one. Unknown names and arity mismatches yield `NotImplemented`.
pub fn apply_named<T: RasterElement>(
    name: &str,
    lhs: &RasterArray<T>,
    rhs: Option<Operand<'_, T>>,
) -> Result<Dispatch<RasterArray<T>>> {
    match rhs {
        Some(rhs) => match name.parse::<BinaryOp>() {
            Ok(op) => apply_binary(op, lhs, rhs),
            Err(_) => Ok(Dispatch::NotImplemented),
        },
        None => match name.parse::<UnaryOp>() {
            Ok(op) => apply_unary(op, lhs),
            Err(_) => Ok(Dispatch::NotImplemented),
        },
    }
}

/// Reduce a raster over its valid cells
pub fn reduce<T: RasterElement>(op: ReduceOp, raster: &RasterArray<T>) -> Reduced<T> {
    match op {
        ReduceOp::Sum => Reduced::Value(raster.sum()),
        ReduceOp::Prod => Reduced::Value(raster.prod()),
        ReduceOp::Min => raster.min().map_or(Reduced::Empty, Reduced::Value),
        ReduceOp::Max => raster.max().map_or(Reduced::Empty, Reduced::Value),
        ReduceOp::All => Reduced::Bool(raster.all()),
        ReduceOp::Any => Reduced::Bool(raster.any()),
    }
}

/// [`reduce`] with the reduction resolved by name
pub fn reduce_named<T: RasterElement>(name: &str, raster: &RasterArray<T>) -> Dispatch<Reduced<T>> {
    match name.parse::<ReduceOp>() {
        Ok(op) => Dispatch::Done(reduce(op, raster)),
        Err(_) => Dispatch::NotImplemented,
    }
}
