//! TF-IDF vocabulary fitting and vector transformation.

pub mod vectorizer;

pub use vectorizer::{SparseVector, TfidfVectorizer};
