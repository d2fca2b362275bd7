//! Truncated singular value decomposition behind a single interface with
//! two implementations: a hand-rolled power-iteration backend that never
//! leaves Rust, and one built on `nalgebra`'s dense SVD. Both are pure
//! Rust — there is no FFI boundary to gate behind a feature flag here,
//! so backend selection is a runtime choice rather than a compile-time
//! one.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::dense::DenseMatrix;
use super::vector::Vector;
use crate::core::errors::{ClassifierError, Result};

const MAX_POWER_ITERATIONS: usize = 500;
const CONVERGENCE_TOLERANCE: f64 = 1e-10;
const ZERO_RESIDUAL: f64 = 1e-9;

/// Result of a (possibly truncated by the caller) SVD: `A ≈ U · diag(S) · Vᵀ`.
#[derive(Debug, Clone)]
pub struct Svd {
    /// `m × r` matrix of left singular vectors.
    pub u: DenseMatrix,
    /// `r` singular values, descending, non-negative.
    pub s: Vec<f64>,
    /// `n × r` matrix of right singular vectors.
    pub v: DenseMatrix,
}

/// Which SVD implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinalgBackend {
    /// In-language power iteration with deflation.
    Native,
    /// `nalgebra`'s dense SVD.
    Accelerated,
}

impl Default for LinalgBackend {
    fn default() -> Self {
        Self::Accelerated
    }
}

/// A truncated SVD provider.
pub trait SvdBackend: std::fmt::Debug {
    /// Compute the full-rank SVD of `a` (m×n), returning `min(m, n)`
    /// singular triplets in descending order.
    fn compute(&self, a: &DenseMatrix) -> Result<Svd>;
}

/// Build the backend named by `backend`.
pub fn build_backend(backend: LinalgBackend) -> Box<dyn SvdBackend> {
    match backend {
        LinalgBackend::Native => Box::new(NativeSvdBackend),
        LinalgBackend::Accelerated => Box::new(AcceleratedSvdBackend),
    }
}

/// Power-iteration-with-deflation SVD. Always available, never calls
/// into a foreign numerical library.
#[derive(Debug, Default)]
pub struct NativeSvdBackend;

impl SvdBackend for NativeSvdBackend {
    fn compute(&self, a: &DenseMatrix) -> Result<Svd> {
        let m = a.rows();
        let n = a.cols();
        let rank = m.min(n);
        if rank == 0 {
            return Ok(Svd {
                u: DenseMatrix::zeros(m, 0),
                s: Vec::new(),
                v: DenseMatrix::zeros(n, 0),
            });
        }

        let at = a.transpose();
        let mut deflated = at.mul_matrix(a); // n x n, symmetric PSD

        let mut triplets: Vec<(f64, Vector, Vector)> = Vec::with_capacity(rank);
        for idx in 0..rank {
            let (eigenvalue, v) = power_iteration(&deflated, idx)?;
            let sigma = eigenvalue.max(0.0).sqrt();
            let u = if sigma > ZERO_RESIDUAL {
                let mut raw = a.mul_vector_parallel(&v);
                raw.scale(1.0 / sigma);
                raw
            } else {
                Vector::zeros(m)
            };
            deflate(&mut deflated, eigenvalue, &v);
            triplets.push((sigma, u, v));
        }

        triplets.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let s: Vec<f64> = triplets.iter().map(|(sigma, _, _)| *sigma).collect();
        let u = assemble_columns(m, triplets.iter().map(|(_, u, _)| u.clone()));
        let v = assemble_columns(n, triplets.iter().map(|(_, _, v)| v.clone()));

        Ok(Svd { u, s, v })
    }
}

/// Find the dominant eigenpair of symmetric `mat` via power iteration.
fn power_iteration(mat: &DenseMatrix, seed_index: usize) -> Result<(f64, Vector)> {
    let n = mat.rows();
    let mut v = seeded_unit_vector(n, seed_index as u64);
    let mut eigenvalue = 0.0;

    for _ in 0..MAX_POWER_ITERATIONS {
        let next = mat.mul_vector_parallel(&v);
        let norm = next.norm();
        if norm < ZERO_RESIDUAL {
            return Ok((0.0, v));
        }
        let mut normalized = next;
        normalized.scale(1.0 / norm);
        let new_eigenvalue = normalized.dot(&mat.mul_vector_parallel(&normalized));
        let delta = (new_eigenvalue - eigenvalue).abs();
        v = normalized;
        eigenvalue = new_eigenvalue;
        if delta < CONVERGENCE_TOLERANCE {
            return Ok((eigenvalue, v));
        }
    }

    warn!(seed_index, "power iteration failed to converge");
    Err(ClassifierError::numerical_with_context(
        "power iteration did not converge within the iteration bound",
        format!("component {seed_index}"),
    ))
}

/// Subtract `eigenvalue * v vᵀ` from `mat`, in place.
fn deflate(mat: &mut DenseMatrix, eigenvalue: f64, v: &Vector) {
    let n = mat.rows();
    for i in 0..n {
        let vi = v.get(i);
        if vi == 0.0 {
            continue;
        }
        for j in 0..n {
            let delta = eigenvalue * vi * v.get(j);
            mat.set(i, j, mat.get(i, j) - delta);
        }
    }
}

/// Deterministic pseudo-random unit vector, so repeated decompositions
/// of the same matrix are bitwise reproducible.
fn seeded_unit_vector(n: usize, seed: u64) -> Vector {
    let mut state = seed ^ 0x9E37_79B9_7F4A_7C15 ^ (n as u64);
    if state == 0 {
        state = 1;
    }
    let mut data = Vec::with_capacity(n);
    for _ in 0..n {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
        data.push(unit * 2.0 - 1.0);
    }
    let v = Vector::from_vec(data);
    let normalized = v.normalized();
    if normalized.norm() == 0.0 {
        Vector::from_vec(vec![1.0 / (n as f64).sqrt(); n])
    } else {
        normalized
    }
}

fn assemble_columns(rows: usize, cols: impl ExactSizeIterator<Item = Vector>) -> DenseMatrix {
    let ncols = cols.len();
    let mut m = DenseMatrix::zeros(rows, ncols);
    for (c, col) in cols.enumerate() {
        for r in 0..rows {
            m.set(r, c, col.get(r));
        }
    }
    m
}

/// SVD backed by `nalgebra::linalg::SVD`.
#[derive(Debug, Default)]
pub struct AcceleratedSvdBackend;

impl SvdBackend for AcceleratedSvdBackend {
    fn compute(&self, a: &DenseMatrix) -> Result<Svd> {
        let m = a.rows();
        let n = a.cols();
        if m == 0 || n == 0 {
            return Ok(Svd {
                u: DenseMatrix::zeros(m, 0),
                s: Vec::new(),
                v: DenseMatrix::zeros(n, 0),
            });
        }

        let matrix = nalgebra::DMatrix::from_row_slice(m, n, a.as_slice());
        let svd = nalgebra::linalg::SVD::new(matrix, true, true);

        let u = svd
            .u
            .ok_or_else(|| ClassifierError::numerical("accelerated SVD did not produce U"))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| ClassifierError::numerical("accelerated SVD did not produce Vᵀ"))?;

        let s: Vec<f64> = svd.singular_values.iter().copied().collect();
        if s.iter().any(|value| !value.is_finite()) {
            return Err(ClassifierError::numerical(
                "accelerated SVD produced a non-finite singular value",
            ));
        }

        let rank = s.len();
        let mut u_data = Vec::with_capacity(m * rank);
        for r in 0..m {
            for c in 0..rank {
                u_data.push(u[(r, c)]);
            }
        }
        let mut v_data = Vec::with_capacity(n * rank);
        for r in 0..n {
            for c in 0..rank {
                v_data.push(v_t[(c, r)]);
            }
        }

        Ok(Svd {
            u: DenseMatrix::from_row_major(m, rank, u_data),
            s,
            v: DenseMatrix::from_row_major(n, rank, v_data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reconstruct(svd: &Svd) -> DenseMatrix {
        let diag = DenseMatrix::diag_from_vector(&svd.s);
        svd.u.mul_matrix(&diag).mul_matrix(&svd.v.transpose())
    }

    #[test]
    fn native_svd_reconstructs_a_small_matrix() {
        let a = DenseMatrix::from_row_major(3, 2, vec![3.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let svd = NativeSvdBackend.compute(&a).expect("svd");
        assert_eq!(svd.s.len(), 2);
        assert!(svd.s[0] >= svd.s[1]);
        let recon = reconstruct(&svd);
        for r in 0..3 {
            for c in 0..2 {
                assert_relative_eq!(recon.get(r, c), a.get(r, c), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn singular_values_are_descending() {
        let a = DenseMatrix::from_row_major(
            3,
            3,
            vec![4.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 1.0],
        );
        let svd = NativeSvdBackend.compute(&a).expect("svd");
        for pair in svd.s.windows(2) {
            assert!(pair[0] >= pair[1] - 1e-9);
        }
    }

    #[test]
    fn zero_dimension_input_is_trivially_empty() {
        let a = DenseMatrix::zeros(0, 0);
        let svd = NativeSvdBackend.compute(&a).expect("svd");
        assert!(svd.s.is_empty());
    }

    #[test]
    fn accelerated_backend_reconstructs_same_matrix() {
        let a = DenseMatrix::from_row_major(3, 2, vec![3.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let svd = AcceleratedSvdBackend.compute(&a).expect("svd");
        let recon = reconstruct(&svd);
        for r in 0..3 {
            for c in 0..2 {
                assert_relative_eq!(recon.get(r, c), a.get(r, c), epsilon = 1e-6);
            }
        }
    }
}
