//! Transaction context
//!
//! A `TransactionContext` is the atomicity boundary a modify operation runs
//! in. It tracks:
//! - status: Active → Committed, or Active → Aborted
//! - read set: the token each key carried when this transaction first saw it
//!
//! Before any write is applied, the read set is validated against the tree
//! (first-committer-wins). A key whose token changed since it was read is a
//! conflict, reported as [`CommitError::Conflict`] and never retried here.
//!
//! The status is shared with [`AbortHandle`]s so another thread can abort a
//! transaction that is still running; the abort takes effect at the next
//! status check, at the latest right before the commit applies.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use strata_core::error::Error;
use strata_core::traits::ValueTree;
use strata_core::types::{CasTimeToken, Key};
use thiserror::Error as ThisError;

/// Lifecycle state of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepting reads and writes
    Active,
    /// Finished successfully
    Committed,
    /// Finished without effect on later writes
    Aborted {
        /// Why the transaction was aborted
        reason: String,
    },
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Active => write!(f, "active"),
            TransactionStatus::Committed => write!(f, "committed"),
            TransactionStatus::Aborted { reason } => write!(f, "aborted ({})", reason),
        }
    }
}

/// Commit failures
#[derive(Debug, ThisError)]
pub enum CommitError {
    /// A key read by the transaction changed before commit
    #[error("key {key} changed since it was read (read {expected:?}, now {actual:?})")]
    Conflict {
        /// Conflicting key
        key: Key,
        /// Token observed at read time
        expected: Option<CasTimeToken>,
        /// Token found at commit time
        actual: Option<CasTimeToken>,
    },

    /// Transaction is no longer active
    #[error("transaction {txn_id} is {status}")]
    NotActive {
        /// Transaction identifier
        txn_id: u64,
        /// Status at the time of the attempt
        status: TransactionStatus,
    },

    /// The tree failed while validating or applying
    #[error(transparent)]
    Storage(#[from] Error),
}

impl From<CommitError> for Error {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Conflict { .. } => Error::Conflict(err.to_string()),
            CommitError::NotActive { txn_id, status } => Error::TransactionNotActive {
                txn_id,
                status: status.to_string(),
            },
            CommitError::Storage(inner) => inner,
        }
    }
}

/// Read-set and status tracking for one transaction
#[derive(Debug)]
pub struct TransactionContext {
    /// Unique transaction identifier
    pub txn_id: u64,
    status: Arc<Mutex<TransactionStatus>>,
    read_set: FxHashMap<Key, Option<CasTimeToken>>,
    writes: usize,
}

impl TransactionContext {
    /// Create an active transaction
    pub fn new(txn_id: u64) -> Self {
        Self {
            txn_id,
            status: Arc::new(Mutex::new(TransactionStatus::Active)),
            read_set: FxHashMap::default(),
            writes: 0,
        }
    }

    /// Current status
    pub fn status(&self) -> TransactionStatus {
        self.status.lock().clone()
    }

    /// Whether the transaction is still active
    pub fn is_active(&self) -> bool {
        matches!(*self.status.lock(), TransactionStatus::Active)
    }

    /// Fail with [`CommitError::NotActive`] unless active
    pub fn ensure_active(&self) -> Result<(), CommitError> {
        let status = self.status.lock();
        match *status {
            TransactionStatus::Active => Ok(()),
            _ => Err(CommitError::NotActive {
                txn_id: self.txn_id,
                status: status.clone(),
            }),
        }
    }

    /// Record that `key` was observed with `castime`
    ///
    /// Only the first observation counts; later reads of the same key
    /// validate against what the transaction saw first.
    pub fn record_read(&mut self, key: &Key, castime: Option<CasTimeToken>) {
        self.read_set.entry(key.clone()).or_insert(castime);
    }

    /// Record this transaction's own write of `key`
    ///
    /// The new token replaces the read-set entry so the transaction does
    /// not conflict with itself.
    pub fn record_write(&mut self, key: &Key, castime: CasTimeToken) {
        self.read_set.insert(key.clone(), Some(castime));
        self.writes += 1;
    }

    /// Record this transaction's own removal of `key`
    pub fn record_remove(&mut self, key: &Key) {
        self.read_set.insert(key.clone(), None);
        self.writes += 1;
    }

    /// Token this transaction observed for `key`, if it read it
    pub fn observed(&self, key: &Key) -> Option<Option<CasTimeToken>> {
        self.read_set.get(key).copied()
    }

    /// Number of keys in the read set
    pub fn read_count(&self) -> usize {
        self.read_set.len()
    }

    /// Number of writes applied through this transaction
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Handle that can abort this transaction from another thread
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            txn_id: self.txn_id,
            status: Arc::clone(&self.status),
        }
    }

    /// Move Active → Committed
    pub fn mark_committed(&mut self) -> Result<(), CommitError> {
        let mut status = self.status.lock();
        match *status {
            TransactionStatus::Active => {
                *status = TransactionStatus::Committed;
                Ok(())
            }
            _ => Err(CommitError::NotActive {
                txn_id: self.txn_id,
                status: status.clone(),
            }),
        }
    }

    /// Move Active → Aborted
    pub fn mark_aborted(&mut self, reason: impl Into<String>) -> Result<(), CommitError> {
        let mut status = self.status.lock();
        match *status {
            TransactionStatus::Active => {
                *status = TransactionStatus::Aborted {
                    reason: reason.into(),
                };
                Ok(())
            }
            _ => Err(CommitError::NotActive {
                txn_id: self.txn_id,
                status: status.clone(),
            }),
        }
    }

    pub(crate) fn read_set(&self) -> impl Iterator<Item = (&Key, &Option<CasTimeToken>)> {
        self.read_set.iter()
    }
}

/// Aborts a running transaction from outside
#[derive(Debug, Clone)]
pub struct AbortHandle {
    txn_id: u64,
    status: Arc<Mutex<TransactionStatus>>,
}

impl AbortHandle {
    /// Transaction this handle controls
    pub fn txn_id(&self) -> u64 {
        self.txn_id
    }

    /// Abort if still active; returns whether this call aborted it
    pub fn abort(&self, reason: impl Into<String>) -> bool {
        let mut status = self.status.lock();
        if matches!(*status, TransactionStatus::Active) {
            *status = TransactionStatus::Aborted {
                reason: reason.into(),
            };
            true
        } else {
            false
        }
    }
}

/// Check every key in the read set still carries the token that was read
pub fn validate_read_set<T: ValueTree + ?Sized>(
    txn: &TransactionContext,
    tree: &T,
) -> Result<(), CommitError> {
    for (key, expected) in txn.read_set() {
        let actual = tree.castime(key)?;
        if actual != *expected {
            return Err(CommitError::Conflict {
                key: key.clone(),
                expected: *expected,
                actual,
            });
        }
    }
    Ok(())
}
