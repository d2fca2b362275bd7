//! Text normalization: the single entry point every classifier goes
//! through before it sees a token.
//!
//! [`clean_word_hash`] and [`tokenize_ordered`] share one pass over the
//! input; the former folds into a [`TermFrequencyMap`], the latter keeps
//! order and duplicates for n-gram assembly in the TF-IDF vectorizer.

use std::collections::HashMap;

use super::stemmer::porter_stem;
use super::stopwords::{is_stopword, Language};
use crate::core::interner::{Token, TokenInterner};

/// Token → occurrence count within a single document.
pub type TermFrequencyMap = HashMap<Token, u32>;

const MIN_TOKEN_LEN: usize = 3;
const MAX_TOKEN_LEN: usize = 25;

/// Split `text` on runs of non-alphanumeric characters, keeping single
/// punctuation marks as their own tokens, and count case-insensitively.
///
/// This is the "raw" hash: no stop-word filtering, no stemming, no
/// length bounds. It exists for callers that want a token inventory
/// closer to the literal input than [`clean_word_hash`] produces.
pub fn word_hash(interner: &TokenInterner, text: &str) -> TermFrequencyMap {
    let mut counts = TermFrequencyMap::new();
    let lowered = text.to_lowercase();
    let mut chars = lowered.chars().peekable();
    let mut buf = String::new();

    while let Some(c) = chars.next() {
        if c.is_alphanumeric() {
            buf.push(c);
            continue;
        }
        if !buf.is_empty() {
            let token = interner.intern(&buf);
            *counts.entry(token).or_insert(0) += 1;
            buf.clear();
        }
        if !c.is_whitespace() {
            let token = interner.intern(&c.to_string());
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    if !buf.is_empty() {
        let token = interner.intern(&buf);
        *counts.entry(token).or_insert(0) += 1;
    }

    counts
}

/// Lowercase, strip non-letters, drop stop words and out-of-range
/// lengths, stem, and accumulate counts. The hash every classifier in
/// this crate actually trains and queries against.
pub fn clean_word_hash(
    interner: &TokenInterner,
    language: Language,
    text: &str,
) -> TermFrequencyMap {
    let mut counts = TermFrequencyMap::new();
    for stem in clean_stems(language, text) {
        let token = interner.intern(&stem);
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Same cleaning as [`clean_word_hash`] but preserving order and
/// duplicates, for n-gram assembly.
pub fn tokenize_ordered(interner: &TokenInterner, language: Language, text: &str) -> Vec<Token> {
    clean_stems(language, text)
        .map(|stem| interner.intern(&stem))
        .collect()
}

fn clean_stems(language: Language, text: &str) -> impl Iterator<Item = String> + '_ {
    let ascii_only: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() { c } else { ' ' })
        .collect();

    ascii_only
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter()
        .filter(move |w| w.len() >= MIN_TOKEN_LEN && w.len() <= MAX_TOKEN_LEN)
        .filter(move |w| !is_stopword(language, w))
        .map(|w| porter_stem(&w))
        .filter(|stem| stem.len() >= MIN_TOKEN_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_word_hash_drops_short_and_stop_words() {
        let interner = TokenInterner::new();
        let hash = clean_word_hash(&interner, Language::English, "The cat sat on a mat");
        let resolved: Vec<&str> = hash.keys().map(|t| interner.resolve(*t)).collect();
        assert!(!resolved.contains(&"on"));
        assert!(!resolved.contains(&"a"));
        assert!(resolved.iter().all(|w| w.len() >= MIN_TOKEN_LEN));
    }

    #[test]
    fn clean_word_hash_stems_and_counts() {
        let interner = TokenInterner::new();
        let hash = clean_word_hash(&interner, Language::English, "running runs run runner");
        let run_token = interner.intern("run");
        assert_eq!(hash.get(&run_token).copied(), Some(2));
    }

    #[test]
    fn tokenize_ordered_preserves_duplicates_and_order() {
        let interner = TokenInterner::new();
        let tokens = tokenize_ordered(&interner, Language::English, "dogs cats dogs");
        let resolved: Vec<&str> = tokens.iter().map(|t| interner.resolve(*t)).collect();
        assert_eq!(resolved, vec!["dog", "cat", "dog"]);
    }

    #[test]
    fn word_hash_keeps_punctuation_as_tokens() {
        let interner = TokenInterner::new();
        let hash = word_hash(&interner, "hello, world!");
        let bang = interner.get("!").expect("interned");
        assert_eq!(hash.get(&bang).copied(), Some(1));
    }

    #[test]
    fn non_ascii_letters_are_stripped() {
        let interner = TokenInterner::new();
        let hash = clean_word_hash(&interner, Language::English, "café naïve über classify");
        for token in hash.keys() {
            assert!(interner.resolve(*token).is_ascii());
        }
    }
}
