//! Sparse matrix assembled from (row, col, value) triples, used to build
//! the term-document matrix before SVD without materializing every
//! zero entry during assembly.

use super::dense::DenseMatrix;

/// Compressed sparse row matrix built from coordinate triples.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Build a `rows × cols` CSR matrix from coordinate triples.
    /// Duplicate `(row, col)` entries accumulate.
    pub fn from_triples(rows: usize, cols: usize, triples: &[(usize, usize, f64)]) -> Self {
        let mut sorted: Vec<(usize, usize, f64)> = triples.to_vec();
        sorted.sort_by_key(|(r, c, _)| (*r, *c));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(sorted.len());
        let mut values = Vec::with_capacity(sorted.len());

        let mut i = 0;
        while i < sorted.len() {
            let (r, c, _) = sorted[i];
            let mut acc = 0.0;
            let mut j = i;
            while j < sorted.len() && sorted[j].0 == r && sorted[j].1 == c {
                acc += sorted[j].2;
                j += 1;
            }
            col_idx.push(c);
            values.push(acc);
            row_ptr[r + 1] += 1;
            i = j;
        }
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored (non-deduplicated-away) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate stored `(row, col, value)` entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |r| {
            let start = self.row_ptr[r];
            let end = self.row_ptr[r + 1];
            (start..end).map(move |k| (r, self.col_idx[k], self.values[k]))
        })
    }

    /// Materialize as a dense matrix. Only used right before handing the
    /// term-document matrix to an SVD backend.
    pub fn to_dense(&self) -> DenseMatrix {
        let mut out = DenseMatrix::zeros(self.rows, self.cols);
        for (r, c, v) in self.iter() {
            out.set(r, c, v);
        }
        out
    }
}
