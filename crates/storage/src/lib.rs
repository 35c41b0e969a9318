//! Storage layer for the modify engine
//!
//! This crate provides the reference collaborators the engine runs against:
//! - MemTree: ordered BTreeMap-backed tree with RwLock, implementing `ValueTree`
//! - BlockStore: DashMap registry of out-of-line chains, each behind its own
//!   RwLock, implementing `ChainLockService`
//!
//! Neither is a paged B-tree or a buffer cache; they honour the collaborator
//! contracts and nothing more.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blocks;
pub mod tree;

pub use blocks::BlockStore;
pub use tree::MemTree;
