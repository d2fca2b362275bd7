//! Row-major dense matrix primitive underlying the SVD backends.

use rayon::prelude::*;

use super::vector::Vector;

/// A dense `rows × cols` matrix of `f64`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// A `rows × cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from row-major data. Panics if `data.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "dense matrix size mismatch");
        Self { rows, cols, data }
    }

    /// Construct a square diagonal matrix from a vector of diagonal
    /// entries.
    pub fn diag_from_vector(values: &[f64]) -> Self {
        let n = values.len();
        let mut m = Self::zeros(n, n);
        for (i, v) in values.iter().enumerate() {
            m.set(i, i, *v);
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }

    /// Extract column `c` as a [`Vector`].
    pub fn column(&self, c: usize) -> Vector {
        Vector::from_vec((0..self.rows).map(|r| self.get(r, c)).collect())
    }

    /// Extract row `r` as a [`Vector`].
    pub fn row(&self, r: usize) -> Vector {
        let start = r * self.cols;
        Vector::from_vec(self.data[start..start + self.cols].to_vec())
    }

    /// Transpose, returning a new matrix.
    pub fn transpose(&self) -> DenseMatrix {
        let mut out = DenseMatrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }

    /// Matrix-vector product `self · v`.
    pub fn mul_vector(&self, v: &Vector) -> Vector {
        assert_eq!(self.cols, v.len(), "matrix-vector size mismatch");
        let mut out = Vector::zeros(self.rows);
        for r in 0..self.rows {
            let mut acc = 0.0;
            for c in 0..self.cols {
                acc += self.get(r, c) * v.get(c);
            }
            out.set(r, acc);
        }
        out
    }

    /// Matrix-vector product, computed one row's dot product per
    /// `rayon` task. Used by the native SVD backend's power-iteration
    /// sweep, where this multiply dominates per-iteration cost and the
    /// rows are independent of one another.
    pub fn mul_vector_parallel(&self, v: &Vector) -> Vector {
        assert_eq!(self.cols, v.len(), "matrix-vector size mismatch");
        let data: Vec<f64> = self
            .data
            .par_chunks(self.cols)
            .map(|row| row.iter().zip(v.as_slice()).map(|(a, b)| a * b).sum())
            .collect();
        Vector::from_vec(data)
    }

    /// Matrix-matrix product `self · other`.
    pub fn mul_matrix(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(self.cols, other.rows, "matrix-matrix size mismatch");
        let mut out = DenseMatrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(r, k);
                if a == 0.0 {
                    continue;
                }
                for c in 0..other.cols {
                    out.set(r, c, out.get(r, c) + a * other.get(k, c));
                }
            }
        }
        out
    }

    /// Raw row-major data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
