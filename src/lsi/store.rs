//! Ordered collection of indexed documents with categories and cached
//! reduced-space vectors. Owned exclusively by the LSI engine.

use std::collections::HashMap;

use uuid::Uuid;

use crate::core::interner::Token;
use crate::core::linalg::Vector;
use crate::core::text::TermFrequencyMap;

/// Stable identifier for an item in an [`LsiStore`].
pub type ItemId = Uuid;

/// A single indexed document.
#[derive(Debug, Clone)]
pub struct LsiItem {
    /// Stable identifier, assigned on insertion.
    pub id: ItemId,
    /// Original text, kept for re-projection and serialization.
    pub text: String,
    /// Optional category label used by `classify`.
    pub category: Option<String>,
    /// Cleaned token frequencies, the raw material for the
    /// term-document matrix.
    pub term_frequency: TermFrequencyMap,
    /// Cached reduced-space representation; `None` until the next
    /// successful `build_index`.
    pub reduced_vector: Option<Vector>,
}

/// Insertion-ordered document store plus the global term→document-count
/// table `build_index` needs to assemble the term-document matrix.
#[derive(Debug, Default)]
pub struct LsiStore {
    items: Vec<LsiItem>,
    global_term_counts: HashMap<Token, usize>,
}

impl LsiStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new item, updating the global term-count table.
    pub fn add_item(
        &mut self,
        id: ItemId,
        text: String,
        category: Option<String>,
        term_frequency: TermFrequencyMap,
    ) {
        for token in term_frequency.keys() {
            *self.global_term_counts.entry(*token).or_insert(0) += 1;
        }
        self.items.push(LsiItem {
            id,
            text,
            category,
            term_frequency,
            reduced_vector: None,
        });
    }

    /// Remove the item with `id`, if present.
    pub fn remove_item(&mut self, id: ItemId) -> Option<LsiItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        let item = self.items.remove(position);
        self.decrement_global_counts(&item);
        Some(item)
    }

    /// Remove and return the most recently inserted item.
    pub fn remove_last_item(&mut self) -> Option<LsiItem> {
        let item = self.items.pop()?;
        self.decrement_global_counts(&item);
        Some(item)
    }

    fn decrement_global_counts(&mut self, item: &LsiItem) {
        for token in item.term_frequency.keys() {
            if let Some(count) = self.global_term_counts.get_mut(token) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.global_term_counts.remove(token);
                }
            }
        }
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[LsiItem] {
        &self.items
    }

    /// Mutable access to items in insertion order, used to write back
    /// cached reduced vectors after a rebuild.
    pub fn items_mut(&mut self) -> &mut [LsiItem] {
        &mut self.items
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find an item by id.
    pub fn get(&self, id: ItemId) -> Option<&LsiItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Every token that appears in at least one item.
    pub fn vocabulary(&self) -> impl Iterator<Item = Token> + '_ {
        self.global_term_counts.keys().copied()
    }

    /// Number of items per category label (uncategorized items excluded).
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for item in &self.items {
            if let Some(category) = &item.category {
                *counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}
