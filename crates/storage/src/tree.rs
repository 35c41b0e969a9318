//! Ordered in-memory tree
//!
//! `MemTree` stands in for the B-tree: a `BTreeMap` keyed by [`Key`] behind a
//! single `RwLock`. Lookups take the read lock, writes the write lock. Per-key
//! atomicity across a whole modify operation is NOT provided here; that is
//! the latch table's job.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use strata_core::error::Result;
use strata_core::traits::{StoredValue, ValueTree};
use strata_core::types::{CasTimeToken, Key};
use strata_core::value::ValueDescriptor;

/// BTreeMap-backed implementation of [`ValueTree`]
#[derive(Debug, Default)]
pub struct MemTree {
    entries: RwLock<BTreeMap<Key, StoredValue>>,
}

impl MemTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether `key` has an entry
    pub fn contains(&self, key: &Key) -> bool {
        self.entries.read().contains_key(key)
    }

    /// All keys in tree order
    pub fn keys(&self) -> Vec<Key> {
        self.entries.read().keys().cloned().collect()
    }
}

impl ValueTree for MemTree {
    fn find(&self, key: &Key) -> Result<Option<StoredValue>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(
        &self,
        key: &Key,
        descriptor: ValueDescriptor,
        castime: CasTimeToken,
    ) -> Result<Option<StoredValue>> {
        let stored = StoredValue {
            descriptor,
            castime,
        };
        Ok(self.entries.write().insert(key.clone(), stored))
    }

    fn remove(&self, key: &Key) -> Result<Option<StoredValue>> {
        Ok(self.entries.write().remove(key))
    }

    fn castime(&self, key: &Key) -> Result<Option<CasTimeToken>> {
        Ok(self.entries.read().get(key).map(|stored| stored.castime))
    }
}
