//! # StrataKV
//!
//! Embedded key/value store with atomic in-place modify operations.
//!
//! Every modification is a read-transform-write step that runs under the
//! key's latch: the transform sees the current value exactly once and either
//! replaces it or leaves it byte-for-byte untouched. Counters
//! (`incr`/`decr`) are the built-in transform; custom ones implement
//! [`ModifyOperation`].
//!
//! ## Quick Start
//!
//! ```
//! use stratakv::prelude::*;
//!
//! let kv = StrataKv::ephemeral()?;
//! kv.set("visits", "41")?;
//! assert_eq!(kv.incr("visits", 1)?, CounterOutcome::Success(42));
//!
//! // Underflow saturates to zero
//! assert_eq!(kv.decr("visits", 100)?, CounterOutcome::Success(0));
//! # Ok::<(), stratakv::Error>(())
//! ```
//!
//! ## Transactions
//!
//! Single-call helpers run in their own transaction. To group work, pass an
//! explicit [`TransactionContext`]:
//!
//! ```
//! use stratakv::prelude::*;
//!
//! let kv = StrataKv::ephemeral()?;
//! kv.set("a", "1")?;
//!
//! let mut txn = kv.begin();
//! kv.counter_update("a", Direction::Increment, 1, &mut txn)?;
//! kv.commit(&mut txn)?;
//! # Ok::<(), stratakv::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod database;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{StrataKv, StrataKvBuilder};
pub use strata_core::error::{Error, Result};

// Re-export engine surface
pub use strata_concurrency::{AbortHandle, TransactionContext, TransactionStatus};
pub use strata_engine::{
    from_fn, CounterOutcome, Direction, EngineConfig, FnOperation, IncrDecrOperation,
    ModifyOperation, TransformResult,
};

// Re-export types
pub use types::*;
