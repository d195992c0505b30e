//! Cache-blocked multiply-accumulate.

use crate::KernelConfig;
use crate::matrix::Matrix;

/// `C += A * B` with recursive blocking.
///
/// Sub-problems whose working set (`l*m + m*n + l*n` elements) exceeds the
/// configured budget are split in half along all three dimensions and the
/// eight pieces are handled one after the other. Below the budget a direct
/// loop runs in i, j, k order (row of A, column of B, then the contraction).
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    cache_elements: usize,
}

/// Index ranges of one sub-product.
///
/// Rows `i..i+l` of A and C, contraction `ka..ka+m` over A's columns and
/// `kb..kb+m` over B's rows, columns `j..j+n` of B and C.
#[derive(Debug, Clone, Copy)]
struct Ranges {
    i: usize,
    l: usize,
    ka: usize,
    kb: usize,
    m: usize,
    j: usize,
    n: usize,
}

impl Kernel {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            cache_elements: config.cache_elements,
        }
    }

    pub fn cache_elements(&self) -> usize {
        self.cache_elements
    }

    /// `c += a * b`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes do not line up.
    pub fn multiply_accumulate(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) {
        assert_eq!(
            a.cols(),
            b.rows(),
            "cannot multiply {}x{} by {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        );
        self.multiply_accumulate_columns(a, 0, b, c);
    }

    /// `c += a[:, column..column + b.rows()] * b`.
    ///
    /// Only the columns of `a` that meet the rows of `b` take part, which
    /// lets a worker multiply its row-block of A against one row-block of
    /// another matrix.
    ///
    /// # Panics
    ///
    /// Panics if the shapes do not line up.
    pub fn multiply_accumulate_columns(&self, a: &Matrix, column: usize, b: &Matrix, c: &mut Matrix) {
        assert!(
            column + b.rows() <= a.cols(),
            "columns {}..{} are outside a matrix with {} columns",
            column,
            column + b.rows(),
            a.cols()
        );
        assert_eq!(a.rows(), c.rows(), "row count of A and C differ");
        assert_eq!(b.cols(), c.cols(), "column count of B and C differ");

        let ranges = Ranges {
            i: 0,
            l: a.rows(),
            ka: column,
            kb: 0,
            m: b.rows(),
            j: 0,
            n: b.cols(),
        };
        self.recurse(a, b, c, ranges);
    }

    fn recurse(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, r: Ranges) {
        let working_set = r.l * r.m + r.m * r.n + r.l * r.n;
        if working_set <= self.cache_elements || (r.l <= 1 && r.m <= 1 && r.n <= 1) {
            direct(a, b, c, r);
            return;
        }

        for (di, l) in halves(r.l) {
            for (dk, m) in halves(r.m) {
                for (dj, n) in halves(r.n) {
                    if l == 0 || m == 0 || n == 0 {
                        continue;
                    }
                    let sub = Ranges {
                        i: r.i + di,
                        l,
                        ka: r.ka + dk,
                        kb: r.kb + dk,
                        m,
                        j: r.j + dj,
                        n,
                    };
                    self.recurse(a, b, c, sub);
                }
            }
        }
    }
}

/// `(offset, len)` of the two halves of `len`; the first gets `len / 2`.
fn halves(len: usize) -> [(usize, usize); 2] {
    let first = len / 2;
    [(0, first), (first, len - first)]
}

fn direct(a: &Matrix, b: &Matrix, c: &mut Matrix, r: Ranges) {
    let (a_cols, b_cols, c_cols) = (a.cols(), b.cols(), c.cols());
    let b = b.as_slice();
    let a = a.as_slice();
    let c = c.as_mut_slice();

    for i in r.i..r.i + r.l {
        let a_row = &a[i * a_cols + r.ka..i * a_cols + r.ka + r.m];
        for j in r.j..r.j + r.n {
            let mut sum = 0.0;
            for (k, aik) in a_row.iter().enumerate() {
                sum += aik * b[(r.kb + k) * b_cols + j];
            }
            c[i * c_cols + j] += sum;
        }
    }
}
