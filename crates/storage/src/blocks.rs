//! Block store for out-of-line values
//!
//! Values above the inline bound live in a [`Chain`] of fixed-size blocks.
//! Each chain sits behind its own `RwLock`, which IS the value lock: holding
//! a read guard is the only way to see a chain's bytes, holding the write
//! guard the only way to change them.
//!
//! # Design
//!
//! - DashMap: chain registry, sharded so lookups of different chains don't contend
//! - Arc<RwLock<Chain>>: guards are `Arc`-owned, so a [`ValueLock`] can move
//!   between scopes without borrowing the registry
//! - AtomicU64: chain id allocation
//!
//! The registry entry is cloned out before locking, so a thread blocked on a
//! chain lock never holds a DashMap shard.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_core::error::{Error, Result};
use strata_core::traits::ChainLockService;
use strata_core::value::{Chain, ChainId, ValueLock};

type ChainCell = Arc<RwLock<Chain>>;

/// Registry of out-of-line chains
pub struct BlockStore {
    /// Live chains by id
    chains: DashMap<ChainId, ChainCell>,
    /// Last allocated chain id
    next_id: AtomicU64,
}

impl BlockStore {
    /// Create an empty block store
    pub fn new() -> Self {
        Self {
            chains: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of live chains
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Whether `chain` is live
    pub fn contains(&self, chain: ChainId) -> bool {
        self.chains.contains_key(&chain)
    }

    /// Total bytes held across all chains
    ///
    /// Takes a read lock on every chain in turn; not for hot paths.
    pub fn total_bytes(&self) -> usize {
        self.cells().iter().map(|cell| cell.read().len()).sum()
    }

    fn cells(&self) -> Vec<ChainCell> {
        self.chains.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    fn cell(&self, chain: ChainId) -> Result<ChainCell> {
        self.chains
            .get(&chain)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::ChainNotFound(chain))
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStore")
            .field("chain_count", &self.chain_count())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl ChainLockService for BlockStore {
    fn acquire_read(&self, chain: ChainId) -> Result<ValueLock> {
        let cell = self.cell(chain)?;
        tracing::trace!(%chain, "acquiring chain read lock");
        Ok(ValueLock::Read {
            chain,
            guard: cell.read_arc(),
        })
    }

    fn acquire_write(&self, chain: ChainId) -> Result<ValueLock> {
        let cell = self.cell(chain)?;
        tracing::trace!(%chain, "acquiring chain write lock");
        Ok(ValueLock::Write {
            chain,
            guard: cell.write_arc(),
        })
    }

    fn allocate(&self) -> Result<ValueLock> {
        let chain = ChainId::new(self.next_id.fetch_add(1, Ordering::AcqRel) + 1);
        let cell: ChainCell = Arc::new(RwLock::new(Chain::default()));
        // Lock before publishing so nobody observes the empty chain
        let guard = cell.write_arc();
        self.chains.insert(chain, cell);
        tracing::trace!(%chain, "allocated chain");
        Ok(ValueLock::Write { chain, guard })
    }

    fn free(&self, chain: ChainId) -> Result<()> {
        let (_, cell) = self
            .chains
            .remove(&chain)
            .ok_or(Error::ChainNotFound(chain))?;
        // Wait out current holders before the storage goes away
        drop(cell.write());
        tracing::trace!(%chain, "freed chain");
        Ok(())
    }
}
