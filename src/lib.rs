//! `textclassify-rs`: multinomial naive-Bayes and LSI text
//! classification over a shared TF-IDF / tokenization substrate.
//!
//! ```text
//!                 ┌────────────────────┐
//!  raw text ─────▶│   core::text        │ clean_word_hash / tokenize_ordered
//!                 └─────────┬──────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!       ┌─────────────┐          ┌───────────────┐
//!       │ bayes        │          │ tfidf          │
//!       │ classifier   │          │ vectorizer     │
//!       └─────────────┘          └───────┬───────┘
//!                                         │ raw term-document matrix
//!                                         ▼
//!                                 ┌───────────────┐
//!                                 │ lsi engine     │──▶ core::linalg (SVD)
//!                                 └───────────────┘
//! ```
//!
//! The three consumer-facing types are [`bayes::BayesClassifier`],
//! [`tfidf::TfidfVectorizer`], and [`lsi::LsiIndex`]. All fallible
//! operations return [`core::errors::Result`].

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod bayes;
pub mod core;
pub mod lsi;
pub mod tfidf;

pub use bayes::{BayesClassifier, CategoryName, CategoryTotals};
pub use core::config::{BayesConfig, DfBound, LsiConfig, TfidfConfig, YamlConfig};
pub use core::errors::{ClassifierError, Result};
pub use core::interner::{Token, TokenInterner};
pub use core::linalg::LinalgBackend;
pub use core::text::Language;
pub use lsi::{ItemId, LsiIndex, LsiItem, RelatedQuery};
pub use tfidf::{SparseVector, TfidfVectorizer};
