//! Core types for the Strata modify engine
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`Key`] and [`CasTimeToken`]: tree keys and the version stamp of a committed value
//! - [`ValueDescriptor`], [`ValueView`], [`NewValue`]: how a value is stored, read and replaced
//! - [`ValueLock`]: the guard over an out-of-line value chain
//! - [`codec`]: the decimal encoding used for counter values
//! - [`traits`]: the collaborator contracts (tree, chain lock service)
//! - [`Error`]: the error type shared by all crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod traits;
pub mod types;
pub mod value;

pub use codec::{DecimalBuf, MAX_U64_DECIMAL_LEN, NUMERIC_PARSE_CAP};
pub use error::{Error, Result};
pub use traits::{ChainLockService, StoredValue, ValueTree};
pub use types::{CasTimeToken, Key, MAX_KEY_SIZE};
pub use value::{
    Chain, ChainId, NewValue, ValueBytes, ValueDescriptor, ValueLimits, ValueLock, ValueMeta,
    ValueStorage, ValueView,
};
