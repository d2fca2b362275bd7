//! Latent Semantic Indexing: incremental document store, truncated-SVD
//! rebuild, and cosine-similarity classify/search/find-related queries.

pub mod engine;
pub mod store;

pub use engine::{LsiIndex, RelatedQuery};
pub use store::{ItemId, LsiItem, LsiStore};
