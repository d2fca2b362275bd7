//! Builds and queries the reduced-rank LSI model: classify, search, and
//! find-related over cosine similarity in the truncated SVD's concept
//! space.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::LsiConfig;
use crate::core::errors::{ClassifierError, Result};
use crate::core::interner::{Token, TokenInterner};
use crate::core::linalg::{build_backend, DenseMatrix, SparseMatrix, Vector};
use crate::core::text::{clean_word_hash, Language};

use super::store::{ItemId, LsiStore};

const LSI_VERSION: u32 = 1;

/// What to compare against in [`LsiIndex::find_related`]: an existing
/// item, or a fresh piece of text.
#[derive(Debug, Clone)]
pub enum RelatedQuery {
    /// Compare against an already-indexed item's cached vector.
    Item(ItemId),
    /// Project this text afresh and compare against it.
    Text(String),
}

#[derive(Debug, Clone)]
struct Decomposition {
    rank: usize,
    singular_values: Vec<f64>,
}

#[derive(Debug, Default)]
struct LsiInner {
    store: LsiStore,
    version: u64,
    built_version: Option<u64>,
    token_order: Vec<Token>,
    token_vectors: HashMap<Token, Vector>,
    decomposition: Option<Decomposition>,
}

/// An incrementally mutable, on-demand-rebuilt LSI index.
///
/// Reads and writes go through an internal `RwLock` so an index handed
/// to multiple threads stays consistent even though the engine is
/// designed around a single logical writer (see the crate's
/// concurrency notes).
#[derive(Debug)]
pub struct LsiIndex {
    interner: Arc<TokenInterner>,
    language: Language,
    config: LsiConfig,
    inner: RwLock<LsiInner>,
}

impl LsiIndex {
    /// Construct an empty index. Fails if `config` is invalid.
    pub fn new(interner: Arc<TokenInterner>, config: LsiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            interner,
            language: Language::default(),
            config,
            inner: RwLock::new(LsiInner::default()),
        })
    }

    /// Use a non-default stop-word language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// The configured linear-algebra backend.
    pub fn backend(&self) -> crate::core::linalg::LinalgBackend {
        self.config.backend
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().store.len()
    }

    /// True if the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.inner.read().store.is_empty()
    }

    /// Item count per category label.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        self.inner.read().store.category_counts()
    }

    /// Snapshot of all items, in insertion order.
    pub fn items(&self) -> Vec<super::store::LsiItem> {
        self.inner.read().store.items().to_vec()
    }

    /// Insert `text` (optionally categorized) and return its new id.
    /// Bumps the version; the index becomes dirty if it was built.
    pub fn add_item(&self, text: &str, category: Option<String>) -> ItemId {
        let hash = clean_word_hash(&self.interner, self.language, text);
        let id = Uuid::new_v4();
        let mut inner = self.inner.write();
        inner.store.add_item(id, text.to_string(), category, hash);
        inner.version += 1;
        id
    }

    /// Remove the item with `id`. Bumps the version.
    pub fn remove_item(&self, id: ItemId) -> Result<()> {
        let mut inner = self.inner.write();
        inner
            .store
            .remove_item(id)
            .ok_or_else(|| unknown_item(id))?;
        inner.version += 1;
        Ok(())
    }

    /// Remove and return the id of the most recently inserted item.
    pub fn remove_last_item(&self) -> Option<ItemId> {
        let mut inner = self.inner.write();
        let item = inner.store.remove_last_item()?;
        inner.version += 1;
        Some(item.id)
    }

    /// Force a rebuild of the reduced-rank model from the current items.
    pub fn build_index(&self) -> Result<()> {
        let mut inner = self.inner.write();
        self.rebuild_locked(&mut inner)
    }

    fn rebuild_locked(&self, inner: &mut LsiInner) -> Result<()> {
        if inner.store.is_empty() {
            return Err(ClassifierError::invalid_argument(
                "cannot build an LSI index with no items",
            ));
        }
        let start = Instant::now();
        info!(items = inner.store.len(), "rebuilding LSI index");

        let mut tokens: Vec<Token> = inner.store.vocabulary().collect();
        tokens.sort_by(|a, b| self.interner.resolve(*a).cmp(self.interner.resolve(*b)));
        let token_index: HashMap<Token, usize> =
            tokens.iter().enumerate().map(|(i, t)| (*t, i)).collect();

        let documents = inner.store.items();
        let triples: Vec<(usize, usize, f64)> = {
            use rayon::prelude::*;
            documents
                .par_iter()
                .enumerate()
                .flat_map_iter(|(d, item)| {
                    item.term_frequency.iter().filter_map(move |(token, count)| {
                        token_index.get(token).map(|&t| (t, d, *count as f64))
                    })
                })
                .collect()
        };

        let matrix: DenseMatrix =
            SparseMatrix::from_triples(tokens.len(), documents.len(), &triples).to_dense();

        let backend = build_backend(self.config.backend);
        let svd = backend.compute(&matrix).map_err(|err| {
            warn!(error = %err, "SVD failed during LSI rebuild");
            err
        })?;

        let full_rank = svd.s.len();
        let rank = choose_rank(&svd.s, self.config.cutoff);

        let document_vectors: Vec<Vector> = (0..documents.len())
            .map(|d| Vector::from_vec((0..rank).map(|i| svd.v.get(d, i) * svd.s[i]).collect()))
            .collect();
        let token_vectors: HashMap<Token, Vector> = tokens
            .iter()
            .enumerate()
            .map(|(t, token)| {
                let vector =
                    Vector::from_vec((0..rank).map(|i| svd.u.get(t, i) * svd.s[i]).collect());
                (*token, vector)
            })
            .collect();

        for (item, vector) in inner.store.items_mut().iter_mut().zip(document_vectors) {
            item.reduced_vector = Some(vector);
        }
        inner.token_order = tokens;
        inner.token_vectors = token_vectors;
        inner.decomposition = Some(Decomposition {
            rank,
            singular_values: svd.s[..rank].to_vec(),
        });
        inner.built_version = Some(inner.version);

        debug!(
            rank,
            full_rank,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "LSI rebuild complete"
        );
        Ok(())
    }

    /// Rebuild if dirty and `auto_rebuild` is set; otherwise error.
    fn ensure_built(&self) -> Result<()> {
        let inner = self.inner.upgradable_read();
        if inner.built_version == Some(inner.version) {
            return Ok(());
        }
        if !self.config.auto_rebuild {
            return Err(ClassifierError::index_not_built(
                "index is dirty and auto_rebuild is disabled; call build_index",
            ));
        }
        let mut inner = RwLockUpgradableReadGuard::upgrade(inner);
        self.rebuild_locked(&mut inner)
    }

    fn project(&self, inner: &LsiInner, text: &str) -> Vector {
        let hash = clean_word_hash(&self.interner, self.language, text);
        let rank = inner.decomposition.as_ref().map(|d| d.rank).unwrap_or(0);
        let mut accumulator = Vector::zeros(rank);
        for (token, count) in &hash {
            if let Some(vector) = inner.token_vectors.get(token) {
                let mut scaled = vector.clone();
                scaled.scale(*count as f64);
                accumulator.add_assign(&scaled);
            }
        }
        accumulator
    }

    /// Classify `text` by cosine similarity to the most similar
    /// categorized item. Returns `None` if no categorized item exists
    /// or the projected query has zero norm.
    pub fn classify(&self, text: &str) -> Result<Option<String>> {
        self.ensure_built()?;
        let inner = self.inner.read();
        let projected = self.project(&inner, text);
        if projected.norm() == 0.0 {
            return Ok(None);
        }

        let mut best: Option<(&str, f64)> = None;
        for item in inner.store.items() {
            let (Some(category), Some(reduced)) = (&item.category, &item.reduced_vector) else {
                continue;
            };
            let similarity = projected.cosine_similarity(reduced);
            let replace = match best {
                None => true,
                Some((_, best_similarity)) => similarity > best_similarity,
            };
            if replace {
                best = Some((category.as_str(), similarity));
            }
        }
        Ok(best.map(|(category, _)| category.to_string()))
    }

    /// Cosine-similarity search against every indexed item. A query that
    /// projects to the zero vector still ranks every item, each at
    /// similarity 0, tie-broken by insertion order.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<ItemId>> {
        self.ensure_built()?;
        let inner = self.inner.read();
        let projected = self.project(&inner, query);
        let ranked = rank_by_similarity(&inner, &projected, None);
        Ok(ranked.into_iter().take(top_k).collect())
    }

    /// Items most similar to an existing item or to fresh text,
    /// excluding the query item itself. A zero-norm query (an
    /// uncategorized item with no reduced vector, or text that projects
    /// to zero) still ranks every remaining item at similarity 0,
    /// tie-broken by insertion order.
    pub fn find_related(&self, query: RelatedQuery, top_k: usize) -> Result<Vec<ItemId>> {
        self.ensure_built()?;
        let inner = self.inner.read();
        let (projected, exclude) = match query {
            RelatedQuery::Item(id) => {
                let item = inner.store.get(id).ok_or_else(|| unknown_item(id))?;
                let vector = item
                    .reduced_vector
                    .clone()
                    .unwrap_or_else(|| Vector::zeros(0));
                (vector, Some(id))
            }
            RelatedQuery::Text(text) => (self.project(&inner, &text), None),
        };
        let ranked = rank_by_similarity(&inner, &projected, exclude);
        Ok(ranked.into_iter().take(top_k).collect())
    }

    /// Serialize the store, configuration, and (if built) the cached
    /// reduced-space vectors to the self-describing JSON format.
    pub fn to_json(&self) -> Result<String> {
        let inner = self.inner.read();
        let items: Vec<LsiItemDocument> = inner
            .store
            .items()
            .iter()
            .map(|item| LsiItemDocument {
                id: item.id,
                text: item.text.clone(),
                category: item.category.clone(),
            })
            .collect();

        let decomposition = if inner.built_version == Some(inner.version) {
            inner.decomposition.as_ref().map(|decomposition| {
                let tokens: Vec<String> = inner
                    .token_order
                    .iter()
                    .map(|t| self.interner.resolve(*t).to_string())
                    .collect();
                let token_vectors = inner
                    .token_order
                    .iter()
                    .map(|t| inner.token_vectors[t].as_slice().to_vec())
                    .collect();
                let document_vectors = inner
                    .store
                    .items()
                    .iter()
                    .map(|item| {
                        item.reduced_vector
                            .clone()
                            .unwrap_or_else(|| Vector::zeros(0))
                    })
                    .map(|v| v.as_slice().to_vec())
                    .collect();
                LsiDecompositionDocument {
                    tokens,
                    singular_values: decomposition.singular_values.clone(),
                    token_vectors,
                    document_vectors,
                }
            })
        } else {
            None
        };

        let document = LsiDocument {
            version: LSI_VERSION,
            kind: "lsi".to_string(),
            config: self.config.clone(),
            items,
            decomposition,
        };
        Ok(serde_json::to_string(&document)?)
    }

    /// Deserialize an index previously written by [`LsiIndex::to_json`].
    pub fn from_json(interner: Arc<TokenInterner>, json: &str) -> Result<Self> {
        let document: LsiDocument = serde_json::from_str(json)?;
        if document.kind != "lsi" {
            return Err(ClassifierError::invalid_argument(format!(
                "expected serialized type 'lsi', found '{}'",
                document.kind
            )));
        }
        if document.version > LSI_VERSION {
            return Err(ClassifierError::unsupported_version(
                document.version,
                LSI_VERSION,
            ));
        }

        let index = Self::new(Arc::clone(&interner), document.config)?;
        {
            let mut inner = index.inner.write();
            for item_doc in &document.items {
                let hash = clean_word_hash(&interner, index.language, &item_doc.text);
                inner.store.add_item(
                    item_doc.id,
                    item_doc.text.clone(),
                    item_doc.category.clone(),
                    hash,
                );
                inner.version += 1;
            }

            if let Some(decomposition) = document.decomposition {
                let tokens: Vec<Token> = decomposition
                    .tokens
                    .iter()
                    .map(|t| interner.intern(t))
                    .collect();
                let token_vectors = tokens
                    .iter()
                    .zip(decomposition.token_vectors.into_iter())
                    .map(|(token, row)| (*token, Vector::from_vec(row)))
                    .collect();
                for (item, row) in inner
                    .store
                    .items_mut()
                    .iter_mut()
                    .zip(decomposition.document_vectors.into_iter())
                {
                    item.reduced_vector = Some(Vector::from_vec(row));
                }
                inner.token_order = tokens;
                inner.token_vectors = token_vectors;
                inner.decomposition = Some(Decomposition {
                    rank: decomposition.singular_values.len(),
                    singular_values: decomposition.singular_values,
                });
                inner.built_version = Some(inner.version);
            }
        }
        Ok(index)
    }
}

fn rank_by_similarity(
    inner: &LsiInner,
    projected: &Vector,
    exclude: Option<ItemId>,
) -> Vec<ItemId> {
    let mut scored: Vec<(ItemId, f64, usize)> = inner
        .store
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| Some(item.id) != exclude)
        .filter_map(|(index, item)| {
            item.reduced_vector
                .as_ref()
                .map(|vector| (item.id, projected.cosine_similarity(vector), index))
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });
    scored.into_iter().map(|(id, _, _)| id).collect()
}

/// Smallest `k` such that the first `k` singular values capture at
/// least `cutoff` of the total squared-singular-value energy, clamped
/// to `[1, full_rank]`.
fn choose_rank(singular_values: &[f64], cutoff: f64) -> usize {
    let full_rank = singular_values.len();
    if full_rank == 0 {
        return 0;
    }
    let total_energy: f64 = singular_values.iter().map(|s| s * s).sum();
    if total_energy <= 0.0 {
        return 1;
    }
    let mut cumulative = 0.0;
    for (i, s) in singular_values.iter().enumerate() {
        cumulative += s * s;
        if cumulative / total_energy >= cutoff {
            return (i + 1).clamp(1, full_rank);
        }
    }
    full_rank
}

fn unknown_item(id: ItemId) -> ClassifierError {
    ClassifierError::invalid_argument_field(format!("no item with id {id}"), "id")
}

#[derive(Debug, Serialize, Deserialize)]
struct LsiItemDocument {
    id: Uuid,
    text: String,
    category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LsiDecompositionDocument {
    tokens: Vec<String>,
    singular_values: Vec<f64>,
    token_vectors: Vec<Vec<f64>>,
    document_vectors: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LsiDocument {
    version: u32,
    #[serde(rename = "type")]
    kind: String,
    config: LsiConfig,
    items: Vec<LsiItemDocument>,
    decomposition: Option<LsiDecompositionDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interner::TokenInterner;

    fn fresh() -> LsiIndex {
        LsiIndex::new(Arc::new(TokenInterner::new()), LsiConfig::default()).unwrap()
    }

    #[test]
    fn build_on_empty_index_fails() {
        let index = fresh();
        assert!(index.build_index().is_err());
    }

    #[test]
    fn classify_with_no_categorized_items_is_none() {
        let index = fresh();
        index.add_item("dogs are loyal pets", None);
        index.build_index().unwrap();
        assert_eq!(index.classify("dogs").unwrap(), None);
    }

    #[test]
    fn topic_recovery() {
        let index = fresh();
        for _ in 0..3 {
            index.add_item("dogs pets loyal", Some("Pets".to_string()));
        }
        for _ in 0..3 {
            index.add_item("cats independent curious", Some("Animals".to_string()));
        }
        index.build_index().unwrap();
        let result = index.classify("dogs are loyal pets").unwrap();
        assert_eq!(result, Some("Pets".to_string()));
    }

    #[test]
    fn find_related_excludes_query_item() {
        let index = fresh();
        let a = index.add_item("dogs pets loyal", None);
        index.add_item("dogs loyal companions", None);
        index.add_item("cats independent curious", None);
        index.build_index().unwrap();
        let related = index.find_related(RelatedQuery::Item(a), 10).unwrap();
        assert!(!related.contains(&a));
    }

    #[test]
    fn dirty_query_without_auto_rebuild_errors() {
        let mut config = LsiConfig::default();
        config.auto_rebuild = false;
        let index = LsiIndex::new(Arc::new(TokenInterner::new()), config).unwrap();
        index.add_item("dogs pets loyal", None);
        assert!(matches!(
            index.search("dogs", 5),
            Err(ClassifierError::IndexNotBuilt { .. })
        ));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let index = fresh();
        index.add_item("dogs pets loyal", Some("Pets".to_string()));
        index.add_item("cats independent curious", Some("Animals".to_string()));
        index.build_index().unwrap();
        let first = index.items();
        index.build_index().unwrap();
        let second = index.items();
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.reduced_vector, b.reduced_vector);
        }
    }

    #[test]
    fn remove_last_item_returns_to_dirty() {
        let index = fresh();
        index.add_item("dogs pets loyal", None);
        let second = index.add_item("cats independent curious", None);
        index.build_index().unwrap();
        let removed = index.remove_last_item();
        assert_eq!(removed, Some(second));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn search_with_unrecognized_query_ranks_all_items_at_zero() {
        let index = fresh();
        index.add_item("dogs pets loyal", None);
        index.add_item("cats independent curious", None);
        index.build_index().unwrap();
        let results = index.search("zzqxw unseenword", 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn find_related_with_unrecognized_text_ranks_all_items() {
        let index = fresh();
        index.add_item("dogs pets loyal", None);
        index.add_item("cats independent curious", None);
        index.build_index().unwrap();
        let results = index
            .find_related(RelatedQuery::Text("zzqxw unseenword".to_string()), 10)
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn json_round_trip_preserves_query_results() {
        let index = fresh();
        index.add_item("dogs pets loyal", Some("Pets".to_string()));
        index.add_item("cats independent curious", Some("Animals".to_string()));
        index.build_index().unwrap();
        let json = index.to_json().unwrap();
        let restored = LsiIndex::from_json(Arc::new(TokenInterner::new()), &json).unwrap();
        assert_eq!(
            restored.classify("dogs are loyal pets").unwrap(),
            Some("Pets".to_string())
        );
    }
}
