//! Transaction manager for coordinating commit operations
//!
//! Provides the atomic write step of a modify operation by orchestrating:
//! 1. Status check (the transaction was not aborted underneath us)
//! 2. Read-set validation (first-committer-wins)
//! 3. Tree write (visibility)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. acquire commit lock
//! 2. ensure_active() - transaction not aborted or finished
//! 3. validate_read_set() - every key read still carries the token we saw
//! 4. IF either fails: return error, tree untouched
//! 5. tree.write() - new descriptor + token become visible
//! 6. record_write() - the transaction's read set adopts the new token
//! 7. release commit lock
//! ```
//!
//! Writes become visible at their own `commit_write`; there is no undo. A
//! `Conflict` or `NotActive` error therefore always means the failing step
//! applied nothing. Finishing a transaction that already wrote never turns
//! into a conflict after the fact.
//!
//! The manager also hands out transaction ids and CAS identifiers. Neither
//! is ever reused; gaps appear when a transaction or an operation fails
//! after allocation and are harmless.

use crate::transaction::{validate_read_set, CommitError, TransactionContext};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use strata_core::traits::{StoredValue, ValueTree};
use strata_core::types::{CasTimeToken, Key};
use strata_core::value::ValueDescriptor;

/// Manages transaction lifecycle and atomic write-back
///
/// # Thread Safety
///
/// Commit steps are serialized through an internal lock so that validation
/// and the tree write form one step: no other commit can change a key
/// between the moment we validate it and the moment we write.
pub struct TransactionManager {
    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Last CAS identifier handed out
    cas: AtomicU64,

    /// Commit serialization lock
    commit_lock: Mutex<()>,
}

impl TransactionManager {
    /// Create a new transaction manager
    ///
    /// # Arguments
    /// * `initial_cas` - CAS identifiers start above this value
    pub fn new(initial_cas: u64) -> Self {
        TransactionManager {
            next_txn_id: AtomicU64::new(1),
            cas: AtomicU64::new(initial_cas),
            commit_lock: Mutex::new(()),
        }
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Last CAS identifier handed out
    pub fn current_cas(&self) -> u64 {
        self.cas.load(Ordering::SeqCst)
    }

    /// Mint a fresh token: next CAS identifier, current wall-clock time
    pub fn next_castime(&self) -> CasTimeToken {
        CasTimeToken::now(self.cas.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Start a new transaction
    pub fn begin(&self) -> TransactionContext {
        let txn = TransactionContext::new(self.next_txn_id());
        tracing::trace!(txn_id = txn.txn_id, "transaction started");
        txn
    }

    /// Validate `txn` and write one value into the tree
    ///
    /// # Returns
    /// - Ok(replaced entry) on success
    /// - Err(CommitError) if the transaction is not active, its read set is
    ///   stale, or the tree write fails; the tree is unchanged in all cases
    pub fn commit_write<T: ValueTree + ?Sized>(
        &self,
        txn: &mut TransactionContext,
        tree: &T,
        key: &Key,
        descriptor: ValueDescriptor,
        castime: CasTimeToken,
    ) -> Result<Option<StoredValue>, CommitError> {
        let _commit_guard = self.commit_lock.lock();

        txn.ensure_active()?;
        if let Err(e) = validate_read_set(txn, tree) {
            tracing::warn!(txn_id = txn.txn_id, %key, error = %e, "commit rejected");
            return Err(e);
        }

        let replaced = tree.write(key, descriptor, castime)?;
        txn.record_write(key, castime);
        tracing::trace!(txn_id = txn.txn_id, %key, %castime, "write committed");
        Ok(replaced)
    }

    /// Validate `txn` and remove one key from the tree
    ///
    /// Same sequence as [`commit_write`](Self::commit_write); removing a key
    /// counts as a write for every transaction that read it. The removed key
    /// stays in `txn`'s read set as absent.
    pub fn commit_remove<T: ValueTree + ?Sized>(
        &self,
        txn: &mut TransactionContext,
        tree: &T,
        key: &Key,
    ) -> Result<Option<StoredValue>, CommitError> {
        let _commit_guard = self.commit_lock.lock();

        txn.ensure_active()?;
        validate_read_set(txn, tree)?;

        let removed = tree.remove(key)?;
        txn.record_remove(key);
        tracing::trace!(txn_id = txn.txn_id, %key, existed = removed.is_some(), "remove committed");
        Ok(removed)
    }

    /// Finish a transaction
    ///
    /// Every write was validated at its own commit point and is already
    /// visible, so a transaction that wrote anything simply commits. A
    /// read-only transaction validates its read set one last time; on
    /// conflict it aborts, and since nothing was applied a retry is safe.
    pub fn commit<T: ValueTree + ?Sized>(
        &self,
        txn: &mut TransactionContext,
        tree: &T,
    ) -> Result<(), CommitError> {
        let _commit_guard = self.commit_lock.lock();

        txn.ensure_active()?;
        if let Err(e) = validate_read_set(txn, tree) {
            if txn.write_count() == 0 {
                let _ = txn.mark_aborted(format!("validation failed: {}", e));
                return Err(e);
            }
            tracing::debug!(txn_id = txn.txn_id, error = %e, "reads overtaken after applied writes");
        }
        txn.mark_committed()
    }

    /// Explicitly abort a transaction
    ///
    /// Writes already applied by earlier operations stay applied; the
    /// transaction simply accepts no further work.
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) -> Result<(), CommitError> {
        txn.mark_aborted(reason)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("next_txn_id", &self.next_txn_id.load(Ordering::Relaxed))
            .field("cas", &self.cas.load(Ordering::Relaxed))
            .finish()
    }
}
