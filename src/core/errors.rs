//! Error types for the textclassify-rs library.
//!
//! Structured error handling for the text pipeline, TF-IDF vectorizer,
//! Bayes classifier, and LSI engine. Every fallible operation in this
//! crate returns [`Result`].

use std::io;

use thiserror::Error;

/// Main result type for textclassify operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Comprehensive error type for all textclassify operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClassifierError {
    /// A caller-supplied option or input is out of domain.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable error message
        message: String,
        /// Field or argument that failed validation
        field: Option<String>,
    },

    /// Operation requires a fitted model.
    #[error("model is not fitted: {message}")]
    NotFitted {
        /// Human-readable error message
        message: String,
    },

    /// LSI query issued while the index is dirty and auto-rebuild is disabled.
    #[error("index is not built: {message}")]
    IndexNotBuilt {
        /// Human-readable error message
        message: String,
    },

    /// SVD failed to converge or encountered non-finite values.
    #[error("numerical error: {message}")]
    Numerical {
        /// Human-readable error message
        message: String,
        /// Context of the numerical computation
        context: Option<String>,
    },

    /// Serialized blob version is newer than this implementation supports.
    #[error("unsupported serialized version: {found} (max supported {max_supported})")]
    UnsupportedVersion {
        /// Version found in the blob
        found: u32,
        /// Maximum version this implementation supports
        max_supported: u32,
    },

    /// I/O related errors (config file loading, etc.)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic internal errors that do not fit another category.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl ClassifierError {
    /// Create a new invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new invalid-argument error naming the offending field.
    pub fn invalid_argument_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new not-fitted error.
    pub fn not_fitted(message: impl Into<String>) -> Self {
        Self::NotFitted {
            message: message.into(),
        }
    }

    /// Create a new index-not-built error.
    pub fn index_not_built(message: impl Into<String>) -> Self {
        Self::IndexNotBuilt {
            message: message.into(),
        }
    }

    /// Create a new numerical error.
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new numerical error with additional context.
    pub fn numerical_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new unsupported-version error.
    pub fn unsupported_version(found: u32, max_supported: u32) -> Self {
        Self::UnsupportedVersion {
            found,
            max_supported,
        }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error, where the variant supports it.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Numerical { context: ctx, .. } | Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            _ => {}
        }
        self
    }
}

impl From<io::Error> for ClassifierError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ClassifierError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors.
pub trait ResultExt<T> {
    /// Add context to an error result, computed lazily.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result.
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ClassifierError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ClassifierError::invalid_argument("bad min_df");
        assert!(matches!(err, ClassifierError::InvalidArgument { .. }));

        let err = ClassifierError::not_fitted("call fit first");
        assert!(matches!(err, ClassifierError::NotFitted { .. }));
    }

    #[test]
    fn test_error_with_context() {
        let err = ClassifierError::internal("something broke").with_context("during rebuild");
        if let ClassifierError::Internal { context, .. } = err {
            assert_eq!(context, Some("during rebuild".to_string()));
        } else {
            panic!("expected Internal error");
        }
    }

    #[test]
    fn test_result_extension() {
        let result: std::result::Result<i32, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let wrapped = result.context("loading config");
        assert!(wrapped.is_err());
    }
}
