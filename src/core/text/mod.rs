//! Tokenization substrate shared by the TF-IDF vectorizer, the Bayes
//! classifier, and the LSI store.

pub mod pipeline;
pub mod stemmer;
pub mod stopwords;

pub use pipeline::{clean_word_hash, tokenize_ordered, word_hash, TermFrequencyMap};
pub use stopwords::Language;
