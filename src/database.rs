//! Main entry point for StrataKV.
//!
//! This module provides the `StrataKv` struct, the handle every caller goes
//! through, and its builder.

use crate::types::Versioned;
use std::path::Path;
use std::sync::Arc;
use strata_concurrency::TransactionContext;
use strata_core::error::Result;
use strata_core::types::{CasTimeToken, Key};
use strata_core::value::{ValueLimits, ValueMeta};
use strata_engine::{CounterOutcome, Direction, Engine, EngineConfig, ModifyOperation};

/// The StrataKV store.
///
/// Cloning is cheap; clones share the same engine.
///
/// # Example
///
/// ```
/// use stratakv::prelude::*;
///
/// let kv = StrataKv::ephemeral()?;
///
/// kv.set("hits", "10")?;
/// assert_eq!(kv.incr("hits", 5)?, CounterOutcome::Success(15));
/// assert_eq!(kv.get("hits")?.unwrap().value, b"15");
///
/// // Rejections are outcomes, not errors
/// assert_eq!(kv.incr("missing", 1)?, CounterOutcome::NotFound);
/// # Ok::<(), stratakv::Error>(())
/// ```
#[derive(Clone)]
pub struct StrataKv {
    inner: Arc<Engine>,
}

impl StrataKv {
    /// Create an in-memory store with default settings.
    pub fn ephemeral() -> Result<Self> {
        Self::builder().open()
    }

    /// Create a store from an explicit configuration.
    pub fn open_with_config(config: EngineConfig) -> Result<Self> {
        let engine = Engine::new(config)?;
        Ok(Self {
            inner: Arc::new(engine),
        })
    }

    /// Create a builder for store configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use stratakv::prelude::*;
    ///
    /// let kv = StrataKv::builder()
    ///     .max_in_node_value_size(64)
    ///     .latch_stripes(16)
    ///     .open()?;
    /// assert_eq!(kv.config().limits.max_in_node_value_size, 64);
    /// # Ok::<(), stratakv::Error>(())
    /// ```
    pub fn builder() -> StrataKvBuilder {
        StrataKvBuilder::new()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.inner
    }

    /// Configuration in effect.
    pub fn config(&self) -> &EngineConfig {
        self.inner.config()
    }

    // =========================================================================
    // Single-call operations (implicit transaction)
    // =========================================================================

    /// Get the current value of `key`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Versioned>> {
        self.inner.get(&Key::new(key)?)
    }

    /// Store `value` under `key` with default metadata.
    ///
    /// Returns the token assigned to the write.
    pub fn set(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<CasTimeToken> {
        self.set_with_meta(key, value, ValueMeta::default())
    }

    /// Store `value` under `key` with explicit metadata.
    pub fn set_with_meta(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        meta: ValueMeta,
    ) -> Result<CasTimeToken> {
        self.inner.put(&Key::new(key)?, meta, value.as_ref())
    }

    /// Delete `key`; returns whether it existed.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.inner.delete(&Key::new(key)?)
    }

    /// Increment the counter at `key` by `delta`.
    ///
    /// Overflow sets the counter to 0.
    pub fn incr(&self, key: impl AsRef<[u8]>, delta: u64) -> Result<CounterOutcome> {
        self.counter(key, Direction::Increment, delta)
    }

    /// Decrement the counter at `key` by `delta`.
    ///
    /// Going below zero sets the counter to 0.
    pub fn decr(&self, key: impl AsRef<[u8]>, delta: u64) -> Result<CounterOutcome> {
        self.counter(key, Direction::Decrement, delta)
    }

    fn counter(&self, key: impl AsRef<[u8]>, direction: Direction, delta: u64) -> Result<CounterOutcome> {
        let key = Key::new(key)?;
        let outcome = self
            .inner
            .modify(&key, strata_engine::IncrDecrOperation::new(direction, delta))?;
        tracing::trace!(%key, ?direction, delta, ?outcome, "counter update");
        Ok(outcome)
    }

    // =========================================================================
    // Explicit transactions
    // =========================================================================

    /// Start a transaction.
    pub fn begin(&self) -> TransactionContext {
        self.inner.begin()
    }

    /// Finish `txn`.
    ///
    /// Every write in `txn` is already visible and was validated when it was
    /// applied, so a transaction that wrote always commits. A read-only
    /// transaction fails with a conflict if anything it read has changed.
    pub fn commit(&self, txn: &mut TransactionContext) -> Result<()> {
        self.inner.commit(txn)
    }

    /// Abort `txn`.
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) -> Result<()> {
        self.inner.abort(txn, reason)
    }

    /// Update the counter at `key` inside `txn`.
    pub fn counter_update(
        &self,
        key: impl AsRef<[u8]>,
        direction: Direction,
        delta: u64,
        txn: &mut TransactionContext,
    ) -> Result<CounterOutcome> {
        self.inner.counter_update(&Key::new(key)?, direction, delta, txn)
    }

    /// Run a custom transform against `key` inside `txn`.
    pub fn apply_modify<M: ModifyOperation>(
        &self,
        key: impl AsRef<[u8]>,
        op: M,
        txn: &mut TransactionContext,
    ) -> Result<M::Outcome> {
        self.inner.apply_modify(&Key::new(key)?, op, txn)
    }
}

impl std::fmt::Debug for StrataKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrataKv").field("engine", &self.inner).finish()
    }
}

/// Builder for store configuration.
///
/// Starts from [`EngineConfig::default`]; every setter overrides one field.
/// The configuration is validated when the store opens.
#[derive(Debug, Clone, Default)]
pub struct StrataKvBuilder {
    config: EngineConfig,
}

impl StrataKvBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file.
    ///
    /// Replaces anything set on the builder so far; later setters still apply.
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.config = EngineConfig::from_file(path)?;
        Ok(self)
    }

    /// Set all value size bounds at once.
    pub fn limits(mut self, limits: ValueLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Largest value stored inline in a tree entry.
    pub fn max_in_node_value_size(mut self, size: usize) -> Self {
        self.config.limits.max_in_node_value_size = size;
        self
    }

    /// Largest value accepted at all.
    pub fn max_value_size(mut self, size: usize) -> Self {
        self.config.limits.max_value_size = size;
        self
    }

    /// Block size of out-of-line chains.
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.limits.block_size = size;
        self
    }

    /// Number of per-key latch stripes.
    pub fn latch_stripes(mut self, stripes: usize) -> Self {
        self.config.latch_stripes = stripes;
        self
    }

    /// CAS identifiers start above this value.
    pub fn initial_cas(mut self, cas: u64) -> Self {
        self.config.initial_cas = cas;
        self
    }

    /// Open the store.
    pub fn open(self) -> Result<StrataKv> {
        StrataKv::open_with_config(self.config)
    }
}
