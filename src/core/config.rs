//! Configuration structs for the TF-IDF vectorizer, Bayes classifier,
//! and LSI engine, validated at construction time so a bad option fails
//! fast rather than surfacing as a confusing error mid-fit.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ClassifierError, Result};
use super::linalg::LinalgBackend;

/// A document-frequency bound: an absolute count, or a fraction of the
/// corpus size resolved once the corpus is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DfBound {
    /// Absolute document count.
    Count(u64),
    /// Fraction of the corpus, in `[0, 1]`.
    Fraction(f64),
}

impl DfBound {
    fn validate(&self, field: &'static str) -> Result<()> {
        if let DfBound::Fraction(f) = self {
            if !(0.0..=1.0).contains(f) {
                return Err(ClassifierError::invalid_argument_field(
                    format!("{field} fraction must be in [0, 1], got {f}"),
                    field,
                ));
            }
        }
        Ok(())
    }

    /// Resolve as a `min_df` bound: fractions round up.
    pub fn resolve_min(&self, num_documents: usize) -> usize {
        match self {
            DfBound::Count(c) => *c as usize,
            DfBound::Fraction(f) => (f * num_documents as f64).ceil() as usize,
        }
    }

    /// Resolve as a `max_df` bound: fractions round down.
    pub fn resolve_max(&self, num_documents: usize) -> usize {
        match self {
            DfBound::Count(c) => *c as usize,
            DfBound::Fraction(f) => (f * num_documents as f64).floor() as usize,
        }
    }
}

/// Configuration for [`crate::tfidf::TfidfVectorizer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    /// Minimum document frequency for a term to enter the vocabulary.
    pub min_df: DfBound,
    /// Maximum document frequency for a term to enter the vocabulary.
    pub max_df: DfBound,
    /// Replace `tf` with `1 + ln(tf)` when `tf > 0`.
    pub sublinear_tf: bool,
    /// Inclusive `(lo, hi)` n-gram length range.
    pub ngram_range: (usize, usize),
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            min_df: DfBound::Count(1),
            max_df: DfBound::Fraction(1.0),
            sublinear_tf: false,
            ngram_range: (1, 1),
        }
    }
}

impl TfidfConfig {
    /// Reject configurations that can never produce a sensible vocabulary.
    pub fn validate(&self) -> Result<()> {
        self.min_df.validate("min_df")?;
        self.max_df.validate("max_df")?;
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi {
            return Err(ClassifierError::invalid_argument_field(
                format!("ngram_range must satisfy 1 <= lo <= hi, got ({lo}, {hi})"),
                "ngram_range",
            ));
        }
        Ok(())
    }
}

/// Configuration for [`crate::bayes::BayesClassifier`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesConfig {
    /// Category names the classifier starts with; more may be added later.
    pub categories: Vec<String>,
}

impl BayesConfig {
    /// Always valid; kept for symmetry with the other config types.
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Configuration for [`crate::lsi::LsiIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LsiConfig {
    /// Rebuild automatically on query if the index is dirty.
    pub auto_rebuild: bool,
    /// Linear-algebra backend used for the truncated SVD.
    pub backend: LinalgBackend,
    /// Fraction of cumulative singular-value energy to retain.
    pub cutoff: f64,
}

impl Default for LsiConfig {
    fn default() -> Self {
        Self {
            auto_rebuild: true,
            backend: LinalgBackend::default(),
            cutoff: 0.75,
        }
    }
}

impl LsiConfig {
    /// Reject a cutoff outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff > 0.0 && self.cutoff <= 1.0) {
            return Err(ClassifierError::invalid_argument_field(
                format!("cutoff must be in (0, 1], got {}", self.cutoff),
                "cutoff",
            ));
        }
        Ok(())
    }
}

/// YAML load/save convenience shared by the caller-facing config types.
/// This is orthogonal to the JSON model-serialization format in
/// [`crate::core::errors`] — configs describe how to build a model, not
/// the fitted model itself.
pub trait YamlConfig: Serialize + for<'de> Deserialize<'de> + Sized {
    /// Serialize to a YAML string.
    fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ClassifierError::from)
    }

    /// Parse from a YAML string.
    fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(ClassifierError::from)
    }

    /// Write as YAML to `path`.
    fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).map_err(ClassifierError::from)
    }

    /// Read and parse YAML from `path`.
    fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(ClassifierError::from)?;
        Self::from_yaml(&contents)
    }
}

impl YamlConfig for TfidfConfig {}
impl YamlConfig for LsiConfig {}
