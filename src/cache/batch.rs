//! Invalidation batch assembly.
//!
//! A batch collects the keys of one orchestrator call, deduplicating while
//! preserving first-insertion order so logged batches are reproducible.
//! Batches are built, submitted once, and discarded; they are never
//! persisted.

use std::collections::HashSet;

use super::keys::CacheKey;

/// Insertion-ordered, deduplicated key set for one store submission.
#[derive(Debug, Default)]
pub struct InvalidationBatch {
    keys: Vec<String>,
    seen: HashSet<String>,
}

impl InvalidationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed key. Returns false if it was already present.
    pub fn push(&mut self, key: CacheKey) -> bool {
        self.push_raw(key.render())
    }

    /// Add an already-rendered key (composite workflows pass raw strings).
    pub fn push_raw(&mut self, key: String) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key.clone());
        self.keys.push(key);
        true
    }

    pub fn extend(&mut self, keys: impl IntoIterator<Item = CacheKey>) {
        for key in keys {
            self.push(key);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Consume the batch into the key list submitted to the store.
    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}
