//! Taylor series on one worker.

use std::mem;

use tracing::debug;

use crate::config::effective_tolerance;
use crate::kernel::Kernel;
use crate::matrix::Matrix;

/// Partial sum of the series together with the index of its last term.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub sum: Matrix,
    pub last_term: u64,
}

/// Sums `I + A + A^2/2! + ...` until the largest entry of a term is at most
/// `tolerance`. A non-positive or NaN tolerance is replaced by
/// [`DEFAULT_TOLERANCE`](crate::DEFAULT_TOLERANCE).
///
/// # Panics
///
/// Panics if `a` is not square.
pub fn exponential(a: &Matrix, tolerance: f64, kernel: &Kernel) -> Series {
    assert_eq!(a.rows(), a.cols(), "matrix must be square");
    let order = a.rows();
    let tolerance = effective_tolerance(tolerance);

    let mut power = a.clone();
    let mut product = Matrix::zeros(order, order);
    let mut sum = Matrix::identity(order);
    sum += &power;

    let mut k = 2;
    loop {
        product.fill_zero();
        kernel.multiply_accumulate(a, &power, &mut product);
        mem::swap(&mut power, &mut product);
        power.divide_by(k);
        sum += &power;

        let max = power.max_abs();
        debug!(k, max, "term added");
        if max <= tolerance {
            break;
        }
        k += 1;
    }

    Series { sum, last_term: k }
}
