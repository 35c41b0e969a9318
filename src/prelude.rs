//! Convenient imports for StrataKV.
//!
//! ```
//! use stratakv::prelude::*;
//!
//! let kv = StrataKv::ephemeral()?;
//! kv.set("key", "value")?;
//! # Ok::<(), stratakv::Error>(())
//! ```

// Main entry point
pub use crate::database::{StrataKv, StrataKvBuilder};

// Error handling
pub use crate::{Error, Result};

// Transforms
pub use crate::{from_fn, CounterOutcome, Direction, ModifyOperation, TransformResult};

// Transactions
pub use crate::{TransactionContext, TransactionStatus};

// Core types
pub use crate::types::{CasTimeToken, Key, ValueMeta, ValueView, Versioned};
