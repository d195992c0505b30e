//! Dense row-major matrix.

use std::ops::{AddAssign, Index, IndexMut};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Error;

/// Dense matrix stored as one contiguous row-major buffer.
///
/// The shape is fixed at construction: `data.len() == rows * cols` always
/// holds. Reshaping means building a new `Matrix`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(order: usize) -> Self {
        Self::identity_block(order, order, 0)
    }

    /// Rows `row_offset..row_offset + rows` of an identity matrix with `cols`
    /// columns.
    pub fn identity_block(rows: usize, cols: usize, row_offset: usize) -> Self {
        let mut m = Self::zeros(rows, cols);
        for i in 0..rows {
            let j = i + row_offset;
            if j < cols {
                m[(i, j)] = 1.0;
            }
        }
        m
    }

    /// Wraps `data` without copying it.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, Error> {
        if data.len() != rows * cols {
            return Err(Error::Shape {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from nested rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, Error> {
        let cols = rows.first().map_or(0, Vec::len);
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::from_vec(rows.len(), cols, data)
    }

    /// Square matrix with entries drawn uniformly from `[-1, 1]`.
    pub fn random(order: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..order * order)
            .map(|_| rng.gen_range(-1.0..=1.0))
            .collect();
        Self {
            rows: order,
            cols: order,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Divides every entry by `k` in place.
    pub fn divide_by(&mut self, k: u64) {
        let k = k as f64;
        for v in &mut self.data {
            *v /= k;
        }
    }

    /// Largest absolute entry, `0.0` for an empty matrix.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |max, v| max.max(v.abs()))
    }

    /// Copy of `self` in the top-left corner of a zero `order x order` matrix.
    pub fn padded(&self, order: usize) -> Self {
        assert!(
            order >= self.rows && order >= self.cols,
            "cannot pad a {}x{} matrix to order {}",
            self.rows,
            self.cols,
            order
        );
        let mut padded = Self::zeros(order, order);
        padded.copy_rows_from(self, 0);
        padded
    }

    /// Copy of the `rows x cols` region starting at (`row`, `col`).
    pub fn submatrix(&self, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        assert!(
            row + rows <= self.rows && col + cols <= self.cols,
            "region {}x{} at ({}, {}) is outside a {}x{} matrix",
            rows,
            cols,
            row,
            col,
            self.rows,
            self.cols
        );
        let mut sub = Self::zeros(rows, cols);
        for i in 0..rows {
            let start = (row + i) * self.cols + col;
            sub.data[i * cols..(i + 1) * cols].copy_from_slice(&self.data[start..start + cols]);
        }
        sub
    }

    /// Writes all of `block` into `self` starting at row `row_offset`,
    /// column 0.
    pub fn copy_rows_from(&mut self, block: &Matrix, row_offset: usize) {
        assert!(
            block.cols <= self.cols && row_offset + block.rows <= self.rows,
            "a {}x{} block does not fit at row {} of a {}x{} matrix",
            block.rows,
            block.cols,
            row_offset,
            self.rows,
            self.cols
        );
        for i in 0..block.rows {
            let start = (row_offset + i) * self.cols;
            self.data[start..start + block.cols].copy_from_slice(block.row(i));
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, other: &Matrix) {
        assert_eq!(
            (self.rows, self.cols),
            (other.rows, other.cols),
            "matrix shapes differ"
        );
        for (s, o) in self.data.iter_mut().zip(&other.data) {
            *s += o;
        }
    }
}
