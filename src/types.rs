//! Public types for the StrataKV API.
//!
//! Re-exports from the internal crates under the names callers use.

// Keys and tokens
pub use strata_core::types::{CasTimeToken, Key, MAX_KEY_SIZE};

// Values
pub use strata_core::value::{NewValue, ValueLimits, ValueMeta, ValueView};

/// A value together with the token of the write that produced it
pub type Versioned = strata_engine::VersionedValue;
