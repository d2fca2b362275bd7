//! Cross-module scenario tests (S1-S6) and round-trip serialization
//! checks that don't belong to any single source file.

use std::sync::Arc;

use approx::assert_relative_eq;
use textclassify_rs::{
    BayesClassifier, LsiConfig, LsiIndex, RelatedQuery, TfidfConfig, TfidfVectorizer,
    TokenInterner,
};

// S1: Bayes spam/ham classification.
#[test]
fn s1_bayes_spam_classification() {
    let interner = Arc::new(TokenInterner::new());
    let mut bayes = BayesClassifier::new(
        Arc::clone(&interner),
        &["Spam".to_string(), "Ham".to_string()],
    );
    bayes.train("Spam", "buy now free offer").unwrap();
    bayes.train("Ham", "hello friend meeting").unwrap();
    assert_eq!(bayes.classify("free offer today").unwrap(), "Spam");
}

fn s2_corpus() -> Vec<String> {
    vec![
        "apple banana cherry".to_string(),
        "apple banana date".to_string(),
        "apple elderberry fig".to_string(),
    ]
}

// S2: IDF ordering by rarity.
#[test]
fn s2_tfidf_idf_ordering() {
    let interner = Arc::new(TokenInterner::new());
    let mut vectorizer = TfidfVectorizer::new(interner, TfidfConfig::default()).unwrap();
    vectorizer.fit(&s2_corpus()).unwrap();

    let idf_apple = vectorizer.idf_of("appl").unwrap();
    let idf_banana = vectorizer.idf_of("banana").unwrap();
    let idf_elderberry = vectorizer.idf_of("elderberri").unwrap();

    assert!(idf_elderberry > idf_banana);
    assert!(idf_banana > idf_apple);
}

// S3: transform output is L2-normalized.
#[test]
fn s3_tfidf_transform_is_normalized() {
    let interner = Arc::new(TokenInterner::new());
    let mut vectorizer = TfidfVectorizer::new(interner, TfidfConfig::default()).unwrap();
    let vectors = vectorizer.fit_transform(&s2_corpus()).unwrap();
    for vector in vectors {
        let norm: f64 = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        assert!((0.9999..=1.0001).contains(&norm));
    }
}

// S4: LSI topic recovery across two clusters.
#[test]
fn s4_lsi_topic_recovery() {
    let interner = Arc::new(TokenInterner::new());
    let index = LsiIndex::new(interner, LsiConfig::default()).unwrap();
    for _ in 0..3 {
        index.add_item("dogs pets loyal", Some("Pets".to_string()));
    }
    for _ in 0..3 {
        index.add_item("cats independent curious", Some("Animals".to_string()));
    }
    index.build_index().unwrap();
    assert_eq!(
        index.classify("dogs are loyal pets").unwrap(),
        Some("Pets".to_string())
    );
}

// S5: train/untrain restores the prior state exactly.
#[test]
fn s5_bayes_untrain_restores_state() {
    let interner = Arc::new(TokenInterner::new());
    let mut bayes = BayesClassifier::new(
        Arc::clone(&interner),
        &["Spam".to_string(), "Ham".to_string()],
    );
    bayes.train("Spam", "buy now free offer").unwrap();
    bayes.train("Ham", "hello friend meeting").unwrap();
    let before = bayes.category_totals();

    bayes.train("Spam", "limited time deal").unwrap();
    bayes.untrain("Spam", "limited time deal").unwrap();
    let after = bayes.category_totals();

    assert_eq!(before, after);
}

// S6: rebuilding twice with no mutation is idempotent.
#[test]
fn s6_lsi_rebuild_idempotence() {
    let interner = Arc::new(TokenInterner::new());
    let index = LsiIndex::new(interner, LsiConfig::default()).unwrap();
    index.add_item("dogs pets loyal", Some("Pets".to_string()));
    index.add_item("cats independent curious", Some("Animals".to_string()));
    index.build_index().unwrap();

    let first: Vec<_> = index.items().into_iter().map(|i| i.reduced_vector).collect();
    index.build_index().unwrap();
    let second: Vec<_> = index.items().into_iter().map(|i| i.reduced_vector).collect();

    for (a, b) in first.iter().zip(second.iter()) {
        match (a, b) {
            (Some(a), Some(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    assert_relative_eq!(x, y, epsilon = 1e-9);
                }
            }
            (None, None) => {}
            _ => panic!("rebuild changed vector presence"),
        }
    }
}

// Cross-cutting: LSI never recommends the query item to itself.
#[test]
fn lsi_find_related_excludes_self() {
    let interner = Arc::new(TokenInterner::new());
    let index = LsiIndex::new(interner, LsiConfig::default()).unwrap();
    let a = index.add_item("dogs pets loyal", None);
    index.add_item("dogs loyal companions", None);
    index.add_item("cats independent curious", None);
    index.build_index().unwrap();

    let related = index.find_related(RelatedQuery::Item(a), 10).unwrap();
    assert!(!related.contains(&a));
}

// Cross-cutting: classifying against an index with no categorized items is null.
#[test]
fn lsi_classify_without_categories_is_none() {
    let interner = Arc::new(TokenInterner::new());
    let index = LsiIndex::new(interner, LsiConfig::default()).unwrap();
    index.add_item("dogs pets loyal", None);
    index.add_item("cats independent curious", None);
    index.build_index().unwrap();

    assert_eq!(index.classify("dogs are loyal pets").unwrap(), None);
}

// Cross-cutting: TF-IDF model round-trips through JSON with identical transforms.
#[test]
fn tfidf_json_round_trip_preserves_transform() {
    let interner = Arc::new(TokenInterner::new());
    let mut vectorizer =
        TfidfVectorizer::new(Arc::clone(&interner), TfidfConfig::default()).unwrap();
    vectorizer.fit(&s2_corpus()).unwrap();

    let json = vectorizer.to_json().unwrap();
    let restored = TfidfVectorizer::from_json(interner, &json).unwrap();

    for doc in s2_corpus() {
        let a = vectorizer.transform(&doc).unwrap();
        let b = restored.transform(&doc).unwrap();
        assert_eq!(a.len(), b.len());
        for (token, weight) in a {
            assert_relative_eq!(weight, b[&token], epsilon = 1e-9);
        }
    }
}

// Cross-cutting: Bayes model round-trips through JSON with identical classification.
#[test]
fn bayes_json_round_trip_preserves_classification() {
    let interner = Arc::new(TokenInterner::new());
    let mut bayes = BayesClassifier::new(
        Arc::clone(&interner),
        &["Spam".to_string(), "Ham".to_string()],
    );
    bayes.train("Spam", "buy now free offer").unwrap();
    bayes.train("Ham", "hello friend meeting").unwrap();

    let json = bayes.to_json().unwrap();
    let restored = BayesClassifier::from_json(Arc::new(TokenInterner::new()), &json).unwrap();

    assert_eq!(
        bayes.classify("free offer today").unwrap(),
        restored.classify("free offer today").unwrap()
    );
}
