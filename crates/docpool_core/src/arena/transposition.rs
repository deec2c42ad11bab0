//! # Transposition Cache
//!
//! Search statistics keyed by external identity, independent of slot
//! lifetime. A state reached again through another path (or re-allocated
//! after eviction) can start from these numbers instead of cold.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cached statistics for one external identity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranspositionEntry {
    /// Visit count at the time of caching.
    pub visits: u32,
    /// Mean value at the time of caching.
    pub value: f64,
    /// Arena tick at which the entry was written.
    pub updated: u64,
}

/// Map from external identity to cached statistics.
#[derive(Debug, Default)]
pub struct TranspositionCache {
    entries: HashMap<String, TranspositionEntry>,
}

impl TranspositionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or overwrites an entry.
    pub fn insert(&mut self, external_id: &str, entry: TranspositionEntry) {
        if let Some(slot) = self.entries.get_mut(external_id) {
            *slot = entry;
        } else {
            self.entries.insert(external_id.to_string(), entry);
        }
    }

    /// Entry for an identity.
    #[must_use]
    pub fn get(&self, external_id: &str) -> Option<TranspositionEntry> {
        self.entries.get(external_id).copied()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
