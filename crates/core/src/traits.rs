//! Collaborator contracts
//!
//! The modify engine does not own the tree structure or the block storage
//! for large values. It talks to them through these traits:
//!
//! - [`ValueTree`]: key lookup and write-back
//! - [`ChainLockService`]: locking, allocation and release of out-of-line chains
//!
//! Implementations must be thread-safe; the engine calls them from any
//! worker thread.

use crate::error::Result;
use crate::types::{CasTimeToken, Key};
use crate::value::{ChainId, ValueDescriptor, ValueLock};

/// A tree entry: the stored value plus the token it was committed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    /// How and where the value is stored
    pub descriptor: ValueDescriptor,
    /// Token assigned at the last successful write
    pub castime: CasTimeToken,
}

/// Tree lookup and write-back
pub trait ValueTree: Send + Sync {
    /// Find the entry for `key`
    fn find(&self, key: &Key) -> Result<Option<StoredValue>>;

    /// Store `descriptor` under `key`, returning the replaced entry
    fn write(
        &self,
        key: &Key,
        descriptor: ValueDescriptor,
        castime: CasTimeToken,
    ) -> Result<Option<StoredValue>>;

    /// Remove the entry for `key`, returning it
    fn remove(&self, key: &Key) -> Result<Option<StoredValue>>;

    /// Token of the entry for `key`, if present
    fn castime(&self, key: &Key) -> Result<Option<CasTimeToken>> {
        Ok(self.find(key)?.map(|stored| stored.castime))
    }
}

/// Lock service for out-of-line value chains
///
/// Locks are released when the returned [`ValueLock`] is dropped.
pub trait ChainLockService: Send + Sync {
    /// Shared access to an existing chain
    fn acquire_read(&self, chain: ChainId) -> Result<ValueLock>;

    /// Exclusive access to an existing chain
    fn acquire_write(&self, chain: ChainId) -> Result<ValueLock>;

    /// Create an empty chain, returned write-locked
    fn allocate(&self) -> Result<ValueLock>;

    /// Release a chain's storage
    ///
    /// Waits for current holders of the chain's lock to finish first.
    fn free(&self, chain: ChainId) -> Result<()>;
}
