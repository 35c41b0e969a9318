//! Engine wiring
//!
//! [`Engine`] owns one instance of every collaborator and hands the
//! executor shared references to them:
//!
//! ```text
//!              ┌──────────────────┐
//!   caller ──▶ │  ModifyExecutor  │
//!              └──┬─────┬─────┬───┘
//!                 │     │     │
//!          MemTree  BlockStore  TransactionManager + KeyLatchTable
//! ```
//!
//! Every public operation goes through the executor, so plain reads, writes
//! and deletes serialize against modify operations on the same key.

use crate::config::EngineConfig;
use crate::executor::ModifyExecutor;
use crate::incr_decr::{CounterOutcome, Direction, IncrDecrOperation};
use crate::modify::ModifyOperation;
use std::sync::Arc;
use strata_concurrency::{KeyLatchTable, TransactionContext, TransactionManager};
use strata_core::error::Result;
use strata_core::types::{CasTimeToken, Key};
use strata_core::value::{NewValue, ValueLimits, ValueMeta};
use strata_storage::{BlockStore, MemTree};

/// A value read from the engine together with its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// Value bytes
    pub value: Vec<u8>,
    /// Value metadata
    pub meta: ValueMeta,
    /// Token of the write that produced this value
    pub castime: CasTimeToken,
}

/// In-memory key/value engine with atomic modify operations
pub struct Engine {
    config: EngineConfig,
    tree: Arc<MemTree>,
    blocks: Arc<BlockStore>,
    txn_manager: Arc<TransactionManager>,
    executor: ModifyExecutor,
}

impl Engine {
    /// Build an engine from a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let tree = Arc::new(MemTree::new());
        let blocks = Arc::new(BlockStore::new());
        let txn_manager = Arc::new(TransactionManager::new(config.initial_cas));
        let latches = Arc::new(KeyLatchTable::with_stripes(config.latch_stripes));
        let executor = ModifyExecutor::new(
            tree.clone(),
            blocks.clone(),
            Arc::clone(&txn_manager),
            latches,
            config.limits,
        );

        tracing::debug!(
            inline = config.limits.max_in_node_value_size,
            max = config.limits.max_value_size,
            stripes = config.latch_stripes,
            "engine started"
        );

        Ok(Self {
            config,
            tree,
            blocks,
            txn_manager,
            executor,
        })
    }

    /// Configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Value size bounds in effect
    pub fn limits(&self) -> &ValueLimits {
        self.executor.limits()
    }

    /// The underlying tree
    pub fn tree(&self) -> &MemTree {
        &self.tree
    }

    /// The underlying block store
    pub fn block_store(&self) -> &BlockStore {
        &self.blocks
    }

    /// Start a transaction
    pub fn begin(&self) -> TransactionContext {
        self.txn_manager.begin()
    }

    /// Finish `txn`
    ///
    /// A read-only transaction validates its reads one last time and fails
    /// with a conflict if any changed. Writes were validated as they were
    /// applied, so a transaction that wrote always commits.
    pub fn commit(&self, txn: &mut TransactionContext) -> Result<()> {
        self.txn_manager.commit(txn, &*self.tree)?;
        Ok(())
    }

    /// Abort `txn`
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) -> Result<()> {
        self.txn_manager.abort(txn, reason)?;
        Ok(())
    }

    /// Run `op` against `key` inside `txn`
    ///
    /// An accepted value gets a fresh token, minted under the key's latch.
    pub fn apply_modify<M: ModifyOperation>(
        &self,
        key: &Key,
        op: M,
        txn: &mut TransactionContext,
    ) -> Result<M::Outcome> {
        self.executor
            .run(key, op, || self.txn_manager.next_castime(), txn)
    }

    /// Increment or decrement the counter at `key` inside `txn`
    pub fn counter_update(
        &self,
        key: &Key,
        direction: Direction,
        delta: u64,
        txn: &mut TransactionContext,
    ) -> Result<CounterOutcome> {
        self.apply_modify(key, IncrDecrOperation::new(direction, delta), txn)
    }

    /// Current value of `key`
    pub fn get(&self, key: &Key) -> Result<Option<VersionedValue>> {
        self.executor.read(key, |found| {
            found.map(|(view, castime)| VersionedValue {
                value: view.bytes().into_owned(),
                meta: view.meta(),
                castime,
            })
        })
    }

    /// Run `op` against `key` in its own single-operation transaction
    pub fn modify<M: ModifyOperation>(&self, key: &Key, op: M) -> Result<M::Outcome> {
        let mut txn = self.begin();
        let outcome = self.apply_modify(key, op, &mut txn)?;
        finish_implicit(&mut txn)?;
        Ok(outcome)
    }

    /// Store `bytes` under `key` in its own transaction; returns the new token
    pub fn put(&self, key: &Key, meta: ValueMeta, bytes: &[u8]) -> Result<CasTimeToken> {
        let mut txn = self.begin();
        let castime = self.executor.write_value(
            key,
            NewValue::new(meta, bytes),
            || self.txn_manager.next_castime(),
            &mut txn,
        )?;
        finish_implicit(&mut txn)?;
        Ok(castime)
    }

    /// Remove `key` in its own transaction; returns whether it existed
    pub fn delete(&self, key: &Key) -> Result<bool> {
        let mut txn = self.begin();
        let existed = self.executor.remove(key, &mut txn)?;
        finish_implicit(&mut txn)?;
        Ok(existed)
    }
}

/// Close a single-operation transaction
///
/// Its one operation was validated under the key latch when it committed,
/// so a later write to the same key is not a conflict for it.
fn finish_implicit(txn: &mut TransactionContext) -> Result<()> {
    txn.mark_committed()?;
    Ok(())
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("entries", &self.tree.len())
            .field("chains", &self.blocks.chain_count())
            .field("txn_manager", &self.txn_manager)
            .finish()
    }
}
