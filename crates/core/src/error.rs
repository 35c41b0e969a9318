//! Error types for the modify engine
//!
//! Logical rejections of a transform (key missing, value not numeric) are
//! NOT errors: they travel back to the caller as the transform's outcome.
//! This enum only covers conditions the caller must treat as failures:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | InvalidKey | Key empty or longer than `MAX_KEY_SIZE` |
//! | ValueTooLarge | Value exceeds the configured maximum value size |
//! | InlineTooLarge | Caller tried to build an inline value above the inline bound |
//! | Conflict | Transaction read set went stale before commit |
//! | TransactionNotActive | Transaction was aborted or already finished |
//! | Corruption | Stored data disagrees with its descriptor |
//! | ChainNotFound | Descriptor references a chain the block store does not hold |
//! | Config | Invalid configuration |
//! | Io | I/O failure while loading configuration |

use crate::value::ChainId;
use thiserror::Error;

/// All errors produced by the modify engine and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Key is empty or too long
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Value exceeds the maximum value size
    #[error("value too large: {size} bytes (max {max})")]
    ValueTooLarge {
        /// Size of the rejected value
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Inline value exceeds the maximum inline size
    #[error("inline value too large: {size} bytes (max {max})")]
    InlineTooLarge {
        /// Size of the rejected value
        size: usize,
        /// Configured inline maximum
        max: usize,
    },

    /// Transaction conflict (first committer wins)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transaction is no longer active
    #[error("transaction {txn_id} is not active: {status}")]
    TransactionNotActive {
        /// Transaction identifier
        txn_id: u64,
        /// Human-readable status
        status: String,
    },

    /// Stored data disagrees with its descriptor
    #[error("corruption: {0}")]
    Corruption(String),

    /// Descriptor references a missing chain
    #[error("chain not found: {0}")]
    ChainNotFound(ChainId),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for modify engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Conflicts may succeed when the whole operation is retried with a
    /// fresh transaction. The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Check if this is a transaction conflict or abort.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::Conflict(_) | Error::TransactionNotActive { .. }
        )
    }

    /// Check if this error indicates storage-layer corruption.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_) | Error::ChainNotFound(_))
    }
}
