//! Striped per-key latches
//!
//! Every operation that reads or writes a key holds that key's latch for its
//! whole duration, so operations on the same key are totally ordered and no
//! one observes a value between "old" and "new".
//!
//! Keys hash onto a fixed set of stripes (FxHash). Two keys may share a
//! stripe and then serialize against each other, which costs throughput but
//! never correctness. An operation holds at most one latch at a time, so
//! stripes cannot deadlock.

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use strata_core::types::Key;

/// Default number of latch stripes
pub const DEFAULT_LATCH_STRIPES: usize = 64;

/// Held latch; released on drop
pub type KeyLatchGuard<'a> = MutexGuard<'a, ()>;

/// Fixed table of key latches
pub struct KeyLatchTable {
    stripes: Box<[Mutex<()>]>,
}

impl KeyLatchTable {
    /// Create a table with [`DEFAULT_LATCH_STRIPES`] stripes
    pub fn new() -> Self {
        Self::with_stripes(DEFAULT_LATCH_STRIPES)
    }

    /// Create a table with `stripes` stripes (at least one)
    pub fn with_stripes(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Number of stripes
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Stripe index for `key`
    pub fn stripe_of(&self, key: &Key) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    /// Block until `key`'s latch is held
    pub fn lock(&self, key: &Key) -> KeyLatchGuard<'_> {
        self.stripes[self.stripe_of(key)].lock()
    }

    /// Take `key`'s latch if it is free
    pub fn try_lock(&self, key: &Key) -> Option<KeyLatchGuard<'_>> {
        self.stripes[self.stripe_of(key)].try_lock()
    }
}

impl Default for KeyLatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyLatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLatchTable")
            .field("stripes", &self.stripes.len())
            .finish()
    }
}
