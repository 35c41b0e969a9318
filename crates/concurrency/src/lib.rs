//! Concurrency layer for the modify engine
//!
//! This crate supplies the transactional context modify operations run in:
//! - KeyLatchTable: striped per-key mutual exclusion (linearizability per key)
//! - TransactionContext: status and read-set tracking, abortable from other threads
//! - TransactionManager: txn/cas allocation and serialized, validated commits
//! - Read-set validation (first-committer-wins)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod latch;
pub mod manager;
pub mod transaction;

pub use latch::{KeyLatchGuard, KeyLatchTable, DEFAULT_LATCH_STRIPES};
pub use manager::TransactionManager;
pub use transaction::{
    validate_read_set, AbortHandle, CommitError, TransactionContext, TransactionStatus,
};
