//! Language-indexed stop-word tables.
//!
//! Stop words are tested against the lowercased, un-stemmed token,
//! before stemming runs — see [`super::pipeline::clean_word_hash`].

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Supported stop-word languages. More variants can be added without
/// touching call sites, which only ever ask for `stopwords_for(tag)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// English stop words (the default).
    English,
}

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can't", "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from", "further", "had", "hadn't",
    "has", "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "let's",
    "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own",
    "same", "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some",
    "such", "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then",
    "there", "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we",
    "we'd", "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's",
    "where", "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with",
    "won't", "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

static ENGLISH_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

/// Return the stop-word set for the given language tag.
pub fn stopwords_for(language: Language) -> &'static HashSet<&'static str> {
    match language {
        Language::English => &ENGLISH_SET,
    }
}

/// True if `word` (already lowercased) is a stop word in `language`.
pub fn is_stopword(language: Language, word: &str) -> bool {
    stopwords_for(language).contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_words_are_stopwords() {
        assert!(is_stopword(Language::English, "the"));
        assert!(is_stopword(Language::English, "and"));
        assert!(is_stopword(Language::English, "a"));
    }

    #[test]
    fn content_words_are_not_stopwords() {
        assert!(!is_stopword(Language::English, "rust"));
        assert!(!is_stopword(Language::English, "classifier"));
    }

    #[test]
    fn default_language_is_english() {
        assert_eq!(Language::default(), Language::English);
    }
}
