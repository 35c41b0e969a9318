//! Modify-operation engine
//!
//! This crate runs read-transform-write operations atomically against the
//! tree:
//! - [`ModifyOperation`]: the contract a transform implements
//! - [`ModifyExecutor`]: locate, lock, invoke, commit or abort
//! - [`IncrDecrOperation`]: saturating counter arithmetic on decimal values
//! - [`Engine`]: wires tree, block store, latches and transactions together
//! - [`EngineConfig`]: value limits and tuning, loadable from TOML

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod executor;
pub mod incr_decr;
pub mod modify;

pub use config::EngineConfig;
pub use engine::{Engine, VersionedValue};
pub use executor::ModifyExecutor;
pub use incr_decr::{CounterOutcome, Direction, IncrDecrOperation};
pub use modify::{from_fn, FnOperation, ModifyOperation, TransformResult};
