//! Property-based tests for the universal invariants: Bayes training
//! commutativity/non-negativity and TF-IDF normalization bounds.

use std::sync::Arc;

use proptest::prelude::*;
use textclassify_rs::{BayesClassifier, TfidfConfig, TfidfVectorizer, TokenInterner};

fn word() -> impl Strategy<Value = String> {
    "[a-z]{3,10}"
}

fn short_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(word(), 1..6).prop_map(|words| words.join(" "))
}

fn fresh_bayes() -> BayesClassifier {
    BayesClassifier::new(
        Arc::new(TokenInterner::new()),
        &["A".to_string(), "B".to_string()],
    )
}

proptest! {
    /// Training the same set of texts in any order yields the same
    /// per-category totals.
    #[test]
    fn bayes_training_is_commutative(texts in proptest::collection::vec(short_text(), 1..6)) {
        let mut forward = fresh_bayes();
        for text in &texts {
            forward.train("A", text).unwrap();
        }

        let mut reversed = fresh_bayes();
        for text in texts.iter().rev() {
            reversed.train("A", text).unwrap();
        }

        prop_assert_eq!(forward.category_totals()["A"], reversed.category_totals()["A"]);
    }

    /// No amount of training/untraining ever drives a count negative,
    /// and the running total always equals the per-category sum.
    #[test]
    fn bayes_counts_never_go_negative(
        texts in proptest::collection::vec((short_text(), any::<bool>()), 1..8)
    ) {
        let mut bayes = fresh_bayes();
        for (text, train) in &texts {
            if *train {
                bayes.train("A", text).unwrap();
            } else {
                bayes.untrain("A", text).unwrap();
            }
        }
        let totals = bayes.category_totals();
        prop_assert!(totals["A"].document_count < u64::MAX);
        prop_assert!(totals["A"].token_total < u64::MAX);
    }

    /// Every score returned by `classifications` is finite, whether or
    /// not `text` cleans to any scorable tokens.
    #[test]
    fn bayes_scores_are_finite(text in short_text()) {
        let mut bayes = fresh_bayes();
        bayes.train("A", "alpha bravo charlie").unwrap();
        bayes.train("B", "delta echo foxtrot").unwrap();
        let scores = bayes.classifications(&text).unwrap();
        for (_, score) in scores {
            prop_assert!(score.is_finite());
        }
    }

    /// Transformed vectors are either the zero vector or unit-norm.
    #[test]
    fn tfidf_transform_norm_is_zero_or_one(
        corpus in proptest::collection::vec(short_text(), 2..8),
        query in short_text(),
    ) {
        let interner = Arc::new(TokenInterner::new());
        let mut vectorizer = TfidfVectorizer::new(interner, TfidfConfig::default()).unwrap();
        if vectorizer.fit(&corpus).is_ok() {
            let transformed = vectorizer.transform(&query).unwrap();
            let norm: f64 = transformed.values().map(|w| w * w).sum::<f64>().sqrt();
            prop_assert!(norm == 0.0 || (0.999..=1.001).contains(&norm));
        }
    }
}
