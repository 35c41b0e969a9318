//! Core types for the modify engine
//!
//! This module defines the identifiers used throughout the system:
//! - [`Key`]: Immutable byte string locating a tree entry
//! - [`CasTimeToken`]: Compare-and-swap identifier plus timestamp of a committed value

use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum key length in bytes
pub const MAX_KEY_SIZE: usize = 250;

/// Immutable key of a tree entry
///
/// Keys are arbitrary byte strings of 1..=[`MAX_KEY_SIZE`] bytes. Cloning a
/// key is cheap (the bytes are shared), which matters because a key is held
/// by the latch table, the read set and the tree at the same time.
///
/// Keys order lexicographically by bytes, which is the tree order.
///
/// # Examples
///
/// ```
/// use strata_core::types::Key;
///
/// let key = Key::new("counter").unwrap();
/// assert_eq!(key.as_bytes(), b"counter");
/// assert!(Key::new("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Arc<[u8]>);

impl Key {
    /// Create a key, validating its length
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Err(Error::InvalidKey("key must not be empty".to_string()));
        }
        if bytes.len() > MAX_KEY_SIZE {
            return Err(Error::InvalidKey(format!(
                "key is {} bytes (max {})",
                bytes.len(),
                MAX_KEY_SIZE
            )));
        }
        Ok(Key(Arc::from(bytes)))
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; keys are validated non-empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Key {
    /// Printable keys render as-is, anything else is escaped
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key(\"{}\")", self)
    }
}

impl TryFrom<&str> for Key {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Key::new(value)
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        Key::new(value)
    }
}

/// Version stamp of a committed value
///
/// A pair of a unique compare-and-swap identifier and a timestamp. The
/// token is minted by whoever drives the executor, attached to the value at
/// commit and kept until the next successful write. Transforms never see or
/// interpret it; the storage layer uses it for staleness checks.
///
/// # Examples
///
/// ```
/// use strata_core::types::CasTimeToken;
///
/// let token = CasTimeToken::new(42, 1_700_000_000);
/// assert_eq!(token.cas, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CasTimeToken {
    /// Unique compare-and-swap identifier
    pub cas: u64,
    /// Wall-clock timestamp in microseconds since the Unix epoch
    pub timestamp: u64,
}

impl CasTimeToken {
    /// Create a token from explicit parts
    pub fn new(cas: u64, timestamp: u64) -> Self {
        Self { cas, timestamp }
    }

    /// Create a token stamped with the current wall-clock time
    pub fn now(cas: u64) -> Self {
        let micros = Utc::now().timestamp_micros().max(0) as u64;
        Self::new(cas, micros)
    }
}

impl std::fmt::Display for CasTimeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cas={}@{}", self.cas, self.timestamp)
    }
}
