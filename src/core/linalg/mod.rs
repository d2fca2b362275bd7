//! Vector / dense matrix / sparse matrix primitives and the truncated
//! SVD the LSI engine and TF-IDF vectorizer build on.

pub mod dense;
pub mod sparse;
pub mod svd;
pub mod vector;

pub use dense::DenseMatrix;
pub use sparse::SparseMatrix;
pub use svd::{build_backend, LinalgBackend, Svd, SvdBackend};
pub use vector::Vector;
