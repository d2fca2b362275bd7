//! Shared substrate: errors, configuration, token interning, the text
//! pipeline, and the linear-algebra primitives the higher-level
//! vectorizer, classifier, and index build on.

pub mod config;
pub mod errors;
pub mod interner;
pub mod linalg;
pub mod text;
