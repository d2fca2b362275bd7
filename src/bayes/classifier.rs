//! Multinomial naive-Bayes classifier with Laplace smoothing, sharing
//! the text pipeline's cleaned token hash with the TF-IDF vectorizer.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{ClassifierError, Result};
use crate::core::interner::{Token, TokenInterner};
use crate::core::text::{clean_word_hash, Language, TermFrequencyMap};

const BAYES_VERSION: u32 = 1;

/// A normalized category label: whitespace-trimmed and -collapsed, with
/// its first character uppercased. Two surface strings that normalize
/// to the same value name the same category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Normalize `raw` into a canonical category name.
    pub fn new(raw: &str) -> Self {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut chars = collapsed.chars();
        let normalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Self(normalized)
    }

    /// Borrow the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-category training state.
#[derive(Debug, Default, Clone)]
struct CategoryState {
    token_counts: std::collections::HashMap<Token, u64>,
    document_count: u64,
    token_total: u64,
}

/// Snapshot of a category's counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTotals {
    /// Documents trained into this category.
    pub document_count: u64,
    /// Sum of token counts trained into this category.
    pub token_total: u64,
}

/// Trains per-category token counts and classifies new text by log
/// posterior under a multinomial naive-Bayes model.
#[derive(Debug)]
pub struct BayesClassifier {
    interner: Arc<TokenInterner>,
    language: Language,
    categories: IndexMap<CategoryName, CategoryState>,
    vocabulary: HashSet<Token>,
    total_tokens: u64,
}

impl BayesClassifier {
    /// Construct a classifier starting with `categories`. Names are
    /// normalized; duplicates collapse to one category.
    pub fn new(interner: Arc<TokenInterner>, categories: &[String]) -> Self {
        let mut classifier = Self {
            interner,
            language: Language::default(),
            categories: IndexMap::new(),
            vocabulary: HashSet::new(),
            total_tokens: 0,
        };
        for name in categories {
            classifier.add_category(name);
        }
        classifier
    }

    /// Use a non-default stop-word language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Category names, in insertion order.
    pub fn categories(&self) -> Vec<String> {
        self.categories.keys().map(|name| name.to_string()).collect()
    }

    /// Add a category if it does not already exist. Idempotent.
    pub fn add_category(&mut self, name: &str) {
        let normalized = CategoryName::new(name);
        self.categories.entry(normalized).or_default();
    }

    /// Remove a category, subtracting its totals from the global count.
    pub fn remove_category(&mut self, name: &str) -> Result<()> {
        let normalized = CategoryName::new(name);
        let removed = self
            .categories
            .shift_remove(&normalized)
            .ok_or_else(|| unknown_category(&normalized))?;
        self.total_tokens = self.total_tokens.saturating_sub(removed.token_total);
        debug!(category = %normalized, "removed category");
        Ok(())
    }

    /// Train `category` on `text`: bump its document count and fold the
    /// cleaned token counts into its running totals.
    pub fn train(&mut self, category: &str, text: &str) -> Result<()> {
        let normalized = CategoryName::new(category);
        let hash = self.clean(text);
        let vocabulary = &mut self.vocabulary;
        let total_tokens = &mut self.total_tokens;
        let state = self
            .categories
            .get_mut(&normalized)
            .ok_or_else(|| unknown_category(&normalized))?;

        state.document_count += 1;
        let mut added = 0u64;
        for (token, count) in &hash {
            *state.token_counts.entry(*token).or_insert(0) += *count as u64;
            added += *count as u64;
            vocabulary.insert(*token);
        }
        state.token_total += added;
        *total_tokens += added;
        Ok(())
    }

    /// Inverse of [`BayesClassifier::train`]. Every decrement floors at
    /// zero; no count ever goes negative.
    pub fn untrain(&mut self, category: &str, text: &str) -> Result<()> {
        let normalized = CategoryName::new(category);
        let hash = self.clean(text);
        let total_tokens = &mut self.total_tokens;
        let state = self
            .categories
            .get_mut(&normalized)
            .ok_or_else(|| unknown_category(&normalized))?;

        state.document_count = state.document_count.saturating_sub(1);
        let mut removed = 0u64;
        for (token, count) in &hash {
            if let Some(entry) = state.token_counts.get_mut(token) {
                let dec = (*count as u64).min(*entry);
                *entry -= dec;
                removed += dec;
            }
        }
        state.token_total = state.token_total.saturating_sub(removed);
        *total_tokens = total_tokens.saturating_sub(removed);
        Ok(())
    }

    /// Log-probability score for every category with at least one
    /// trained document. Categories with zero documents are omitted.
    /// Text that cleans to no scorable tokens still yields a score per
    /// eligible category, driven by its prior alone.
    pub fn classifications(&self, text: &str) -> Result<IndexMap<String, f64>> {
        let hash = self.clean(text);

        let eligible: Vec<(&CategoryName, &CategoryState)> = self
            .categories
            .iter()
            .filter(|(_, state)| state.document_count > 0)
            .collect();
        if eligible.is_empty() {
            return Err(ClassifierError::not_fitted(
                "no category has been trained with any document",
            ));
        }

        let vocabulary_size = self.vocabulary.len() as f64;
        let total_documents: u64 = eligible.iter().map(|(_, state)| state.document_count).sum();

        let mut scores = IndexMap::with_capacity(eligible.len());
        for (name, state) in eligible {
            let denom = state.token_total as f64 + vocabulary_size;
            let mut score = 0.0;
            for (token, count) in &hash {
                let n_c = *state.token_counts.get(token).unwrap_or(&0) as f64;
                score += (*count as f64) * ((n_c + 1.0) / denom).ln();
            }
            score += (state.document_count as f64 / total_documents as f64).ln();
            scores.insert(name.to_string(), score);
        }
        Ok(scores)
    }

    /// The argmax category under [`BayesClassifier::classifications`],
    /// ties broken by insertion order.
    pub fn classify(&self, text: &str) -> Result<String> {
        let scores = self.classifications(text)?;
        let mut best: Option<(&str, f64)> = None;
        for (name, score) in &scores {
            let replace = match best {
                None => true,
                Some((_, best_score)) => *score > best_score,
            };
            if replace {
                best = Some((name.as_str(), *score));
            }
        }
        best.map(|(name, _)| name.to_string())
            .ok_or_else(|| ClassifierError::internal("classifications produced no candidates"))
    }

    /// Per-category document/token totals, for diagnostics and tests.
    pub fn category_totals(&self) -> IndexMap<String, CategoryTotals> {
        self.categories
            .iter()
            .map(|(name, state)| {
                (
                    name.to_string(),
                    CategoryTotals {
                        document_count: state.document_count,
                        token_total: state.token_total,
                    },
                )
            })
            .collect()
    }

    fn clean(&self, text: &str) -> TermFrequencyMap {
        clean_word_hash(&self.interner, self.language, text)
    }

    /// Serialize to the self-describing JSON interchange format.
    pub fn to_json(&self) -> Result<String> {
        let mut categories = Vec::with_capacity(self.categories.len());
        let mut token_counts = Vec::with_capacity(self.categories.len());
        let mut document_counts = Vec::with_capacity(self.categories.len());
        let mut token_totals = Vec::with_capacity(self.categories.len());
        for (name, state) in &self.categories {
            categories.push(name.to_string());
            document_counts.push(state.document_count);
            token_totals.push(state.token_total);
            token_counts.push(
                state
                    .token_counts
                    .iter()
                    .map(|(t, c)| (self.interner.resolve(*t).to_string(), *c))
                    .collect(),
            );
        }
        let document = BayesDocument {
            version: BAYES_VERSION,
            kind: "bayes".to_string(),
            categories,
            token_counts,
            document_counts,
            token_totals,
            total_tokens: self.total_tokens,
        };
        Ok(serde_json::to_string(&document)?)
    }

    /// Deserialize a model previously written by [`BayesClassifier::to_json`].
    pub fn from_json(interner: Arc<TokenInterner>, json: &str) -> Result<Self> {
        let document: BayesDocument = serde_json::from_str(json)?;
        if document.kind != "bayes" {
            return Err(ClassifierError::invalid_argument(format!(
                "expected serialized type 'bayes', found '{}'",
                document.kind
            )));
        }
        if document.version > BAYES_VERSION {
            return Err(ClassifierError::unsupported_version(
                document.version,
                BAYES_VERSION,
            ));
        }

        let mut categories = IndexMap::new();
        let mut vocabulary = HashSet::new();
        for (((name, counts), document_count), token_total) in document
            .categories
            .into_iter()
            .zip(document.token_counts)
            .zip(document.document_counts)
            .zip(document.token_totals)
        {
            let token_counts = counts
                .into_iter()
                .map(|(term, count)| {
                    let token = interner.intern(&term);
                    vocabulary.insert(token);
                    (token, count)
                })
                .collect();
            categories.insert(
                CategoryName::new(&name),
                CategoryState {
                    token_counts,
                    document_count,
                    token_total,
                },
            );
        }

        Ok(Self {
            interner,
            language: Language::default(),
            categories,
            vocabulary,
            total_tokens: document.total_tokens,
        })
    }
}

fn unknown_category(name: &CategoryName) -> ClassifierError {
    ClassifierError::invalid_argument_field(format!("unknown category '{name}'"), "category")
}

#[derive(Debug, Serialize, Deserialize)]
struct BayesDocument {
    version: u32,
    #[serde(rename = "type")]
    kind: String,
    categories: Vec<String>,
    token_counts: Vec<std::collections::HashMap<String, u64>>,
    document_counts: Vec<u64>,
    token_totals: Vec<u64>,
    total_tokens: u64,
}
