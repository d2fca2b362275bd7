//! Multinomial naive-Bayes classification over the shared text pipeline.

pub mod classifier;

pub use classifier::{BayesClassifier, CategoryName, CategoryTotals};
