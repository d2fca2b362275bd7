//! TF-IDF vectorizer: fits a vocabulary and inverse-document-frequency
//! table from a corpus, then transforms documents into L2-normalized
//! sparse vectors.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::info;

use crate::core::config::{DfBound, TfidfConfig};
use crate::core::errors::{ClassifierError, Result};
use crate::core::interner::{Token, TokenInterner};
use crate::core::text::{tokenize_ordered, Language};

/// Token → weight. Absent tokens are implicitly zero.
pub type SparseVector = HashMap<Token, f64>;

const TFIDF_VERSION: u32 = 1;

/// A fitted (or not-yet-fitted) TF-IDF model.
#[derive(Debug)]
pub struct TfidfVectorizer {
    interner: Arc<TokenInterner>,
    language: Language,
    config: TfidfConfig,
    vocabulary: IndexMap<Token, usize>,
    idf: HashMap<Token, f64>,
    num_documents: usize,
    fitted: bool,
}

impl TfidfVectorizer {
    /// Construct an unfitted vectorizer. Fails if `config` is invalid.
    pub fn new(interner: Arc<TokenInterner>, config: TfidfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            interner,
            language: Language::default(),
            config,
            vocabulary: IndexMap::new(),
            idf: HashMap::new(),
            num_documents: 0,
            fitted: false,
        })
    }

    /// Use a non-default stop-word language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// True once `fit` has completed successfully.
    pub fn fitted(&self) -> bool {
        self.fitted
    }

    /// Number of documents the vocabulary was fit on.
    pub fn num_documents(&self) -> usize {
        self.num_documents
    }

    /// Size of the fitted vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Vocabulary terms in index order.
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabulary
            .keys()
            .map(|t| self.interner.resolve(*t).to_string())
            .collect()
    }

    /// IDF weight of a term, if it is in the vocabulary.
    pub fn idf_of(&self, term: &str) -> Option<f64> {
        let token = self.interner.get(term)?;
        self.idf.get(&token).copied()
    }

    fn ngram_sequence(&self, text: &str) -> Vec<Token> {
        let ordered = tokenize_ordered(&self.interner, self.language, text);
        ngrams_ordered(&self.interner, &ordered, self.config.ngram_range)
    }

    /// Fit the vocabulary and IDF table from `corpus`. Replaces any
    /// previous fit atomically — failures leave the prior state intact.
    pub fn fit(&mut self, corpus: &[String]) -> Result<()> {
        if corpus.is_empty() {
            return Err(ClassifierError::invalid_argument("corpus must not be empty"));
        }
        info!(documents = corpus.len(), "fitting TF-IDF vocabulary");

        let num_documents = corpus.len();
        let doc_term_sets: Vec<HashSet<Token>> = corpus
            .par_iter()
            .map(|doc| self.ngram_sequence(doc).into_iter().collect())
            .collect();

        let mut document_frequency: HashMap<Token, usize> = HashMap::new();
        for terms in &doc_term_sets {
            for token in terms {
                *document_frequency.entry(*token).or_insert(0) += 1;
            }
        }

        let min_bound = self.config.min_df.resolve_min(num_documents);
        let max_bound = self.config.max_df.resolve_max(num_documents);

        let mut kept: Vec<Token> = document_frequency
            .iter()
            .filter(|(_, &df)| df >= min_bound && df <= max_bound)
            .map(|(token, _)| *token)
            .collect();
        kept.sort_by(|a, b| self.interner.resolve(*a).cmp(self.interner.resolve(*b)));

        let mut vocabulary = IndexMap::with_capacity(kept.len());
        let mut idf = HashMap::with_capacity(kept.len());
        for (index, token) in kept.into_iter().enumerate() {
            let df = document_frequency[&token];
            let weight = ((1.0 + num_documents as f64) / (1.0 + df as f64)).ln() + 1.0;
            vocabulary.insert(token, index);
            idf.insert(token, weight);
        }

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.num_documents = num_documents;
        self.fitted = true;
        Ok(())
    }

    /// Transform `text` into an L2-normalized sparse vector over the
    /// fitted vocabulary. Requires [`TfidfVectorizer::fit`] to have run.
    pub fn transform(&self, text: &str) -> Result<SparseVector> {
        if !self.fitted {
            return Err(ClassifierError::not_fitted(
                "TfidfVectorizer::transform called before fit",
            ));
        }

        let mut term_frequency: HashMap<Token, u32> = HashMap::new();
        for token in self.ngram_sequence(text) {
            if self.vocabulary.contains_key(&token) {
                *term_frequency.entry(token).or_insert(0) += 1;
            }
        }

        let mut weights: SparseVector = HashMap::with_capacity(term_frequency.len());
        for (token, count) in term_frequency {
            let tf = if self.config.sublinear_tf {
                1.0 + (count as f64).ln()
            } else {
                count as f64
            };
            weights.insert(token, tf * self.idf[&token]);
        }

        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in weights.values_mut() {
                *weight /= norm;
            }
        }
        Ok(weights)
    }

    /// Fit on `corpus`, then transform every document in input order.
    pub fn fit_transform(&mut self, corpus: &[String]) -> Result<Vec<SparseVector>> {
        self.fit(corpus)?;
        corpus.par_iter().map(|doc| self.transform(doc)).collect()
    }

    /// Serialize the fitted (or unfitted) model to the self-describing
    /// JSON interchange format.
    pub fn to_json(&self) -> Result<String> {
        let document = TfidfDocument {
            version: TFIDF_VERSION,
            kind: "tfidf".to_string(),
            min_df: self.config.min_df,
            max_df: self.config.max_df,
            sublinear_tf: self.config.sublinear_tf,
            ngram_range: self.config.ngram_range,
            vocabulary: self
                .vocabulary
                .iter()
                .map(|(t, i)| (self.interner.resolve(*t).to_string(), *i))
                .collect(),
            idf: self
                .idf
                .iter()
                .map(|(t, v)| (self.interner.resolve(*t).to_string(), *v))
                .collect(),
            num_documents: self.num_documents,
            fitted: self.fitted,
        };
        Ok(serde_json::to_string(&document)?)
    }

    /// Deserialize a model previously written by [`TfidfVectorizer::to_json`].
    pub fn from_json(interner: Arc<TokenInterner>, json: &str) -> Result<Self> {
        let document: TfidfDocument = serde_json::from_str(json)?;
        if document.kind != "tfidf" {
            return Err(ClassifierError::invalid_argument(format!(
                "expected serialized type 'tfidf', found '{}'",
                document.kind
            )));
        }
        if document.version > TFIDF_VERSION {
            return Err(ClassifierError::unsupported_version(
                document.version,
                TFIDF_VERSION,
            ));
        }

        let config = TfidfConfig {
            min_df: document.min_df,
            max_df: document.max_df,
            sublinear_tf: document.sublinear_tf,
            ngram_range: document.ngram_range,
        };
        config.validate()?;

        let vocabulary = document
            .vocabulary
            .into_iter()
            .map(|(term, index)| (interner.intern(&term), index))
            .collect();
        let idf = document
            .idf
            .into_iter()
            .map(|(term, weight)| (interner.intern(&term), weight))
            .collect();

        Ok(Self {
            interner,
            language: Language::default(),
            config,
            vocabulary,
            idf,
            num_documents: document.num_documents,
            fitted: document.fitted,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TfidfDocument {
    version: u32,
    #[serde(rename = "type")]
    kind: String,
    min_df: DfBound,
    max_df: DfBound,
    sublinear_tf: bool,
    ngram_range: (usize, usize),
    vocabulary: IndexMap<String, usize>,
    idf: HashMap<String, f64>,
    num_documents: usize,
    fitted: bool,
}

/// Emit contiguous n-grams of lengths `range.0..=range.1` from an
/// ordered token stream, joining multi-token grams with `_`.
fn ngrams_ordered(interner: &TokenInterner, tokens: &[Token], range: (usize, usize)) -> Vec<Token> {
    let (lo, hi) = range;
    let mut out = Vec::new();
    for n in lo..=hi {
        if n == 0 || n > tokens.len() {
            continue;
        }
        for window in tokens.windows(n) {
            if n == 1 {
                out.push(window[0]);
            } else {
                // Most n-gram ranges stay within a handful of tokens; avoid a
                // heap allocation for the common case of small windows.
                let parts: SmallVec<[&str; 4]> =
                    window.iter().map(|t| interner.resolve(*t)).collect();
                let joined = parts.join("_");
                out.push(interner.intern(&joined));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corpus() -> Vec<String> {
        vec![
            "apple banana cherry".to_string(),
            "apple banana date".to_string(),
            "apple elderberry fig".to_string(),
        ]
    }

    #[test]
    fn fit_rejects_empty_corpus() {
        let interner = Arc::new(TokenInterner::new());
        let mut v = TfidfVectorizer::new(interner, TfidfConfig::default()).unwrap();
        assert!(v.fit(&[]).is_err());
    }

    #[test]
    fn transform_before_fit_is_not_fitted_error() {
        let interner = Arc::new(TokenInterner::new());
        let v = TfidfVectorizer::new(interner, TfidfConfig::default()).unwrap();
        assert!(matches!(
            v.transform("hello"),
            Err(ClassifierError::NotFitted { .. })
        ));
    }

    #[test]
    fn idf_ordering_matches_rarity() {
        let interner = Arc::new(TokenInterner::new());
        let mut v = TfidfVectorizer::new(interner, TfidfConfig::default()).unwrap();
        v.fit(&corpus()).unwrap();
        let idf_apple = v.idf_of("appl").unwrap();
        let idf_banana = v.idf_of("banana").unwrap();
        let idf_elderberry = v.idf_of("elderberri").unwrap();
        assert!(idf_elderberry > idf_banana);
        assert!(idf_banana > idf_apple);
    }

    #[test]
    fn transform_is_l2_normalized() {
        let interner = Arc::new(TokenInterner::new());
        let mut v = TfidfVectorizer::new(interner, TfidfConfig::default()).unwrap();
        let vectors = v.fit_transform(&corpus()).unwrap();
        for vec in vectors {
            let norm = vec.values().map(|w| w * w).sum::<f64>().sqrt();
            assert!(norm == 0.0 || (0.9999..=1.0001).contains(&norm));
        }
    }

    #[test]
    fn df_pruning_respects_bounds() {
        let interner = Arc::new(TokenInterner::new());
        let mut config = TfidfConfig::default();
        config.min_df = DfBound::Count(2);
        let mut v = TfidfVectorizer::new(interner, config).unwrap();
        v.fit(&corpus()).unwrap();
        // Only "appl" (df=3) and "banana" (df=2) clear a min_df of 2.
        assert_eq!(v.vocabulary_size(), 2);
        assert!(v.idf_of("appl").is_some());
        assert!(v.idf_of("banana").is_some());
        assert!(v.idf_of("elderberri").is_none());
    }

    #[test]
    fn json_round_trip_preserves_transform() {
        let interner = Arc::new(TokenInterner::new());
        let mut v = TfidfVectorizer::new(Arc::clone(&interner), TfidfConfig::default()).unwrap();
        v.fit(&corpus()).unwrap();
        let json = v.to_json().unwrap();
        let restored = TfidfVectorizer::from_json(interner, &json).unwrap();
        let a = v.transform("apple banana").unwrap();
        let b = restored.transform("apple banana").unwrap();
        assert_eq!(a.len(), b.len());
        for (token, weight) in a {
            assert_relative_eq!(weight, b[&token], epsilon = 1e-9);
        }
    }

    #[test]
    fn wrong_type_field_is_rejected() {
        let interner = Arc::new(TokenInterner::new());
        let json = r#"{"version":1,"type":"bayes"}"#;
        assert!(TfidfVectorizer::from_json(interner, json).is_err());
    }

    #[test]
    fn ngram_range_joins_with_underscore() {
        let interner = Arc::new(TokenInterner::new());
        let mut config = TfidfConfig::default();
        config.ngram_range = (1, 2);
        let mut v = TfidfVectorizer::new(interner, config).unwrap();
        v.fit(&["natural language processing".to_string()]).unwrap();
        assert!(v.feature_names().iter().any(|f| f.contains('_')));
    }
}
