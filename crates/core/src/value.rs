//! Value representation
//!
//! A tree entry stores its value in one of two shapes:
//!
//! - **Inline**: the bytes live in the entry itself, up to
//!   [`ValueLimits::max_in_node_value_size`].
//! - **Chained**: the entry holds a [`ChainId`]; the bytes live in a
//!   [`Chain`] of fixed-size blocks owned by the block store and guarded by
//!   its own lock.
//!
//! Readers never touch a chain without holding its [`ValueLock`]. A
//! [`ValueView`] borrows either the inline bytes or the locked chain, so it
//! cannot outlive the lock that produced it. Replacement values are built as
//! an owned [`NewValue`], which carries the original metadata and its own
//! bytes and is moved (never borrowed) back to the executor.
//!
//! ## Invariants
//!
//! - `size` always equals the stored byte length
//! - inline bytes never exceed the inline bound
//! - no value exceeds `max_value_size`

use crate::error::{Error, Result};
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::RawRwLock;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Default inline bound, in bytes
pub const DEFAULT_MAX_IN_NODE_VALUE_SIZE: usize = 250;

/// Default hard maximum value size (1 MiB)
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Default chain block size, in bytes
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Byte buffer of a replacement value
///
/// Small values (every formatted counter) stay on the stack.
pub type ValueBytes = SmallVec<[u8; 24]>;

/// Non-length metadata carried by every value
///
/// Opaque to the engine: a transform's output copies it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ValueMeta {
    /// Client-defined flags
    pub flags: u32,
    /// Expiry time as stored by the client protocol (0 = never)
    pub exptime: u32,
}

impl ValueMeta {
    /// Create metadata with the given flags and no expiry
    pub fn with_flags(flags: u32) -> Self {
        Self { flags, exptime: 0 }
    }
}

/// Size bounds for stored values
///
/// Owned by the engine configuration and handed to whoever builds
/// descriptors; there are no global size constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueLimits {
    /// Largest value stored inline in a tree entry
    pub max_in_node_value_size: usize,
    /// Largest value accepted at all
    pub max_value_size: usize,
    /// Block size of out-of-line chains
    pub block_size: usize,
}

impl Default for ValueLimits {
    fn default() -> Self {
        Self {
            max_in_node_value_size: DEFAULT_MAX_IN_NODE_VALUE_SIZE,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ValueLimits {
    /// Check the limits are mutually consistent
    ///
    /// The inline bound must hold any formatted `u64`, so counters never
    /// leave the inline class.
    pub fn validate(&self) -> Result<()> {
        if self.max_in_node_value_size < crate::codec::MAX_U64_DECIMAL_LEN {
            return Err(Error::Config(format!(
                "max_in_node_value_size {} cannot hold a 64-bit counter ({} bytes)",
                self.max_in_node_value_size,
                crate::codec::MAX_U64_DECIMAL_LEN
            )));
        }
        if self.max_value_size < self.max_in_node_value_size {
            return Err(Error::Config(format!(
                "max_value_size {} is below max_in_node_value_size {}",
                self.max_value_size, self.max_in_node_value_size
            )));
        }
        if self.block_size == 0 {
            return Err(Error::Config("block_size must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Whether a value of `len` bytes is stored inline
    #[inline]
    pub fn fits_inline(&self, len: usize) -> bool {
        len <= self.max_in_node_value_size
    }

    /// Reject values above the hard maximum
    pub fn check_value_size(&self, len: usize) -> Result<()> {
        if len > self.max_value_size {
            return Err(Error::ValueTooLarge {
                size: len,
                max: self.max_value_size,
            });
        }
        Ok(())
    }
}

/// Identifier of an out-of-line block chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    /// Wrap a raw identifier
    pub fn new(id: u64) -> Self {
        ChainId(id)
    }

    /// Raw identifier
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

/// Out-of-line value bytes, split into fixed-size blocks
///
/// Every block but the last is exactly `block_size` bytes.
#[derive(Debug, Default)]
pub struct Chain {
    blocks: Vec<Box<[u8]>>,
    len: usize,
}

impl Chain {
    /// Split `bytes` into blocks of `block_size`
    pub fn from_bytes(bytes: &[u8], block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            blocks: bytes
                .chunks(block_size)
                .map(|chunk| chunk.to_vec().into_boxed_slice())
                .collect(),
            len: bytes.len(),
        }
    }

    /// Total length of the chained bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the chain holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterate over the blocks in order
    pub fn blocks(&self) -> impl Iterator<Item = &[u8]> {
        self.blocks.iter().map(|b| &b[..])
    }

    /// Sum of block lengths; differs from `len()` only if the chain is damaged
    pub fn stored_len(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// Copy the whole chain into one contiguous buffer
    pub fn assemble(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for block in self.blocks() {
            out.extend_from_slice(block);
        }
        out
    }

    /// Copy the first `out.len()` bytes (or fewer) into `out`
    ///
    /// Returns the number of bytes copied.
    pub fn copy_prefix(&self, out: &mut [u8]) -> usize {
        let mut copied = 0;
        for block in self.blocks() {
            if copied == out.len() {
                break;
            }
            let n = block.len().min(out.len() - copied);
            out[copied..copied + n].copy_from_slice(&block[..n]);
            copied += n;
        }
        copied
    }

    /// Replace the contents with `bytes`
    pub fn overwrite(&mut self, bytes: &[u8], block_size: usize) {
        *self = Chain::from_bytes(bytes, block_size);
    }
}

/// Where the bytes of a value live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueStorage {
    /// Bytes stored in the tree entry
    Inline(Box<[u8]>),
    /// Bytes stored in an out-of-line chain
    Chained(ChainId),
}

/// Stored value as the tree holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDescriptor {
    meta: ValueMeta,
    size: usize,
    storage: ValueStorage,
}

impl ValueDescriptor {
    /// Build an inline descriptor
    ///
    /// Fails with [`Error::InlineTooLarge`] if `bytes` exceed the inline bound.
    pub fn inline(meta: ValueMeta, bytes: &[u8], limits: &ValueLimits) -> Result<Self> {
        if !limits.fits_inline(bytes.len()) {
            return Err(Error::InlineTooLarge {
                size: bytes.len(),
                max: limits.max_in_node_value_size,
            });
        }
        Ok(Self {
            meta,
            size: bytes.len(),
            storage: ValueStorage::Inline(Box::from(bytes)),
        })
    }

    /// Build a descriptor referencing a chain of `size` bytes
    pub fn chained(meta: ValueMeta, chain: ChainId, size: usize, limits: &ValueLimits) -> Result<Self> {
        limits.check_value_size(size)?;
        Ok(Self {
            meta,
            size,
            storage: ValueStorage::Chained(chain),
        })
    }

    /// Value metadata
    pub fn meta(&self) -> ValueMeta {
        self.meta
    }

    /// Declared size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Storage shape
    pub fn storage(&self) -> &ValueStorage {
        &self.storage
    }

    /// Whether the bytes are inline
    pub fn is_inline(&self) -> bool {
        matches!(self.storage, ValueStorage::Inline(_))
    }

    /// Chain holding the bytes, if out-of-line
    pub fn chain_id(&self) -> Option<ChainId> {
        match self.storage {
            ValueStorage::Chained(id) => Some(id),
            ValueStorage::Inline(_) => None,
        }
    }

    /// Inline bytes, if inline
    pub fn inline_bytes(&self) -> Option<&[u8]> {
        match &self.storage {
            ValueStorage::Inline(bytes) => Some(&bytes[..]),
            ValueStorage::Chained(_) => None,
        }
    }
}

type ChainReadGuard = ArcRwLockReadGuard<RawRwLock, Chain>;
type ChainWriteGuard = ArcRwLockWriteGuard<RawRwLock, Chain>;

/// Guard over an out-of-line value chain
///
/// Held for the duration of one logical operation and released on drop.
/// Values without a chain use [`ValueLock::Empty`].
#[derive(Default)]
pub enum ValueLock {
    /// No chain to guard
    #[default]
    Empty,
    /// Shared access to a chain
    Read {
        /// Guarded chain
        chain: ChainId,
        /// Held read guard
        guard: ChainReadGuard,
    },
    /// Exclusive access to a chain
    Write {
        /// Guarded chain
        chain: ChainId,
        /// Held write guard
        guard: ChainWriteGuard,
    },
}

impl ValueLock {
    /// Lock guarding nothing
    pub fn empty() -> Self {
        ValueLock::Empty
    }

    /// Chain this lock guards
    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            ValueLock::Empty => None,
            ValueLock::Read { chain, .. } | ValueLock::Write { chain, .. } => Some(*chain),
        }
    }

    /// Whether the lock guards nothing
    pub fn is_empty(&self) -> bool {
        matches!(self, ValueLock::Empty)
    }

    /// Whether the lock grants exclusive access
    pub fn is_write(&self) -> bool {
        matches!(self, ValueLock::Write { .. })
    }

    /// Read access to the guarded chain
    pub fn chain(&self) -> Option<&Chain> {
        match self {
            ValueLock::Empty => None,
            ValueLock::Read { guard, .. } => Some(&**guard),
            ValueLock::Write { guard, .. } => Some(&**guard),
        }
    }

    /// Write access to the guarded chain; only for write locks
    pub fn chain_mut(&mut self) -> Option<&mut Chain> {
        match self {
            ValueLock::Write { guard, .. } => Some(&mut **guard),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ValueLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueLock::Empty => write!(f, "ValueLock::Empty"),
            ValueLock::Read { chain, .. } => write!(f, "ValueLock::Read({})", chain),
            ValueLock::Write { chain, .. } => write!(f, "ValueLock::Write({})", chain),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ViewBody<'a> {
    Inline(&'a [u8]),
    Chained(&'a Chain),
}

/// Read view of a stored value
///
/// Borrows the inline bytes or the locked chain; chained bytes are only
/// assembled when asked for. The borrow ties the view to the lock.
#[derive(Debug, Clone, Copy)]
pub struct ValueView<'a> {
    meta: ValueMeta,
    size: usize,
    body: ViewBody<'a>,
}

impl<'a> ValueView<'a> {
    /// View over inline bytes
    pub fn inline(meta: ValueMeta, bytes: &'a [u8]) -> Self {
        Self {
            meta,
            size: bytes.len(),
            body: ViewBody::Inline(bytes),
        }
    }

    /// View over a locked chain
    pub fn chained(meta: ValueMeta, chain: &'a Chain) -> Self {
        Self {
            meta,
            size: chain.len(),
            body: ViewBody::Chained(chain),
        }
    }

    /// View a stored descriptor through the lock acquired for it
    ///
    /// Fails with [`Error::Corruption`] when the descriptor and the stored
    /// bytes disagree: wrong chain locked, missing lock, or length mismatch.
    pub fn from_descriptor(descriptor: &'a ValueDescriptor, lock: &'a ValueLock) -> Result<Self> {
        match descriptor.storage() {
            ValueStorage::Inline(bytes) => {
                if bytes.len() != descriptor.size() {
                    return Err(Error::Corruption(format!(
                        "inline value holds {} bytes but descriptor declares {}",
                        bytes.len(),
                        descriptor.size()
                    )));
                }
                Ok(Self::inline(descriptor.meta(), bytes))
            }
            ValueStorage::Chained(id) => {
                if lock.chain_id() != Some(*id) {
                    return Err(Error::Corruption(format!(
                        "{} read without holding its lock (held: {:?})",
                        id, lock
                    )));
                }
                let chain = lock.chain().ok_or_else(|| {
                    Error::Corruption(format!("{} lock holds no chain", id))
                })?;
                if chain.len() != descriptor.size() || chain.stored_len() != chain.len() {
                    return Err(Error::Corruption(format!(
                        "{} holds {} bytes in blocks ({} recorded) but descriptor declares {}",
                        id,
                        chain.stored_len(),
                        chain.len(),
                        descriptor.size()
                    )));
                }
                Ok(Self::chained(descriptor.meta(), chain))
            }
        }
    }

    /// Value length in bytes
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Value metadata
    pub fn meta(&self) -> ValueMeta {
        self.meta
    }

    /// Whether the bytes are inline
    pub fn is_inline(&self) -> bool {
        matches!(self.body, ViewBody::Inline(_))
    }

    /// The value bytes; borrowed when inline, assembled when chained
    pub fn bytes(&self) -> Cow<'a, [u8]> {
        match self.body {
            ViewBody::Inline(bytes) => Cow::Borrowed(bytes),
            ViewBody::Chained(chain) => Cow::Owned(chain.assemble()),
        }
    }

    /// Copy up to `out.len()` leading bytes into `out`
    pub fn copy_prefix(&self, out: &mut [u8]) -> usize {
        match self.body {
            ViewBody::Inline(bytes) => {
                let n = bytes.len().min(out.len());
                out[..n].copy_from_slice(&bytes[..n]);
                n
            }
            ViewBody::Chained(chain) => chain.copy_prefix(out),
        }
    }

    /// Replacement value with new bytes and this value's metadata
    pub fn with_bytes(&self, bytes: impl AsRef<[u8]>) -> NewValue {
        NewValue::new(self.meta, bytes)
    }
}

/// Owned replacement value returned by a transform
///
/// Owns its bytes, so it stays valid for as long as the executor holds it,
/// including after the transform that built it is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewValue {
    meta: ValueMeta,
    bytes: ValueBytes,
}

impl NewValue {
    /// Build a value from metadata and bytes
    pub fn new(meta: ValueMeta, bytes: impl AsRef<[u8]>) -> Self {
        Self {
            meta,
            bytes: SmallVec::from_slice(bytes.as_ref()),
        }
    }

    /// Value metadata
    pub fn meta(&self) -> ValueMeta {
        self.meta
    }

    /// Value bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Value length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the bytes are held without a heap allocation
    pub fn is_stack_backed(&self) -> bool {
        !self.bytes.spilled()
    }
}
