//! Modify-operation executor
//!
//! Runs one [`ModifyOperation`] against one key as a single atomic step.
//!
//! ## Run Sequence
//!
//! ```text
//! 1. ensure_active()          - txn not aborted or finished
//! 2. latch(key)               - serializes every operation on the key
//! 3. tree.find(key)           - locate; record the token in the read set
//! 4. acquire_read(chain)      - only for out-of-line values
//! 5. operate(view)            - exactly once
//! 6. release chain lock
//! 7a. Reject: release latch, return outcome (tree untouched)
//! 7b. Accept: mint()          - token taken under the latch
//!             place value (inline, or a fresh chain)
//!             commit_write()  - status + read-set validation + tree write
//!             free old chain on success, new chain on failure
//!             release latch, return outcome
//! ```
//!
//! Out-of-line values are never rewritten in place. An accepted value gets a
//! fresh chain that becomes visible with the tree write, so a failed commit
//! leaves the old chain exactly as it was.
//!
//! Tokens are minted by the caller's closure only once the latch is held and
//! the transform accepted, so successive tokens on one key never go
//! backwards.

use crate::modify::{ModifyOperation, TransformResult};
use std::sync::Arc;
use strata_concurrency::{KeyLatchTable, TransactionContext, TransactionManager};
use strata_core::error::{Error, Result};
use strata_core::traits::{ChainLockService, StoredValue, ValueTree};
use strata_core::types::{CasTimeToken, Key};
use strata_core::value::{ChainId, NewValue, ValueDescriptor, ValueLimits, ValueLock, ValueView};

/// Executes modify operations against a tree
pub struct ModifyExecutor {
    tree: Arc<dyn ValueTree>,
    chains: Arc<dyn ChainLockService>,
    txn_manager: Arc<TransactionManager>,
    latches: Arc<KeyLatchTable>,
    limits: ValueLimits,
}

impl ModifyExecutor {
    /// Create an executor over the given collaborators
    pub fn new(
        tree: Arc<dyn ValueTree>,
        chains: Arc<dyn ChainLockService>,
        txn_manager: Arc<TransactionManager>,
        latches: Arc<KeyLatchTable>,
        limits: ValueLimits,
    ) -> Self {
        Self {
            tree,
            chains,
            txn_manager,
            latches,
            limits,
        }
    }

    /// Value size bounds in effect
    pub fn limits(&self) -> &ValueLimits {
        &self.limits
    }

    /// Run `op` against `key` inside `txn`
    ///
    /// If the transform accepts, `mint` is called once, under the key's
    /// latch, and its token becomes the entry's token. Rejections never
    /// mint.
    ///
    /// # Errors
    /// - [`Error::TransactionNotActive`] if `txn` was aborted or finished
    /// - [`Error::Conflict`] if `txn`'s read set went stale
    /// - [`Error::Corruption`] if the stored value disagrees with its descriptor
    /// - [`Error::ValueTooLarge`] if the accepted value exceeds the maximum
    ///
    /// A rejection is not an error; its outcome is returned as `Ok`.
    pub fn run<M, C>(
        &self,
        key: &Key,
        op: M,
        mint: C,
        txn: &mut TransactionContext,
    ) -> Result<M::Outcome>
    where
        M: ModifyOperation,
        C: FnOnce() -> CasTimeToken,
    {
        txn.ensure_active()?;
        let name = op.name();
        let _latch = self.latches.lock(key);

        let stored = self.tree.find(key)?;
        txn.record_read(key, stored.as_ref().map(|s| s.castime));

        let result = match &stored {
            None => op.operate(None),
            Some(stored) => {
                let lock = self.lock_for_read(key, &stored.descriptor)?;
                let view = ValueView::from_descriptor(&stored.descriptor, &lock).map_err(|e| {
                    tracing::error!(%key, error = %e, "stored value failed validation");
                    e
                })?;
                op.operate(Some(view))
            }
        };

        match result {
            TransformResult::Reject { outcome } => {
                tracing::debug!(txn_id = txn.txn_id, %key, op = name, "transform rejected");
                Ok(outcome)
            }
            TransformResult::Accept { value, outcome } => {
                let castime = mint();
                self.commit_value(key, value, castime, txn)?;
                tracing::debug!(txn_id = txn.txn_id, %key, op = name, %castime, "transform committed");
                Ok(outcome)
            }
        }
    }

    /// Store `value` under `key` unconditionally inside `txn`
    ///
    /// Returns the token the value was committed with. Goes through the
    /// same latch, minting, placement and commit path as an accepted
    /// transform.
    pub fn write_value<C>(
        &self,
        key: &Key,
        value: NewValue,
        mint: C,
        txn: &mut TransactionContext,
    ) -> Result<CasTimeToken>
    where
        C: FnOnce() -> CasTimeToken,
    {
        txn.ensure_active()?;
        let _latch = self.latches.lock(key);
        let castime = mint();
        self.commit_value(key, value, castime, txn)?;
        Ok(castime)
    }

    /// Remove `key` inside `txn`; returns whether it existed
    pub fn remove(&self, key: &Key, txn: &mut TransactionContext) -> Result<bool> {
        txn.ensure_active()?;
        let _latch = self.latches.lock(key);

        let removed = self.txn_manager.commit_remove(txn, &*self.tree, key)?;
        let Some(removed) = removed else {
            return Ok(false);
        };
        if let Some(chain) = removed.descriptor.chain_id() {
            self.release_chain(chain);
        }
        Ok(true)
    }

    /// Read `key` under its latch
    ///
    /// `f` sees the value and its token while the chain lock (if any) is
    /// held, or `None` if the key is absent.
    pub fn read<R, F>(&self, key: &Key, f: F) -> Result<R>
    where
        F: FnOnce(Option<(ValueView<'_>, CasTimeToken)>) -> R,
    {
        let _latch = self.latches.lock(key);
        let Some(stored) = self.tree.find(key)? else {
            return Ok(f(None));
        };
        let lock = self.lock_for_read(key, &stored.descriptor)?;
        let view = ValueView::from_descriptor(&stored.descriptor, &lock).map_err(|e| {
            tracing::error!(%key, error = %e, "stored value failed validation");
            e
        })?;
        Ok(f(Some((view, stored.castime))))
    }

    fn lock_for_read(&self, key: &Key, descriptor: &ValueDescriptor) -> Result<ValueLock> {
        let Some(chain) = descriptor.chain_id() else {
            return Ok(ValueLock::empty());
        };
        self.chains.acquire_read(chain).map_err(|e| match e {
            Error::ChainNotFound(missing) => {
                tracing::error!(%key, chain = %missing, "entry references a missing chain");
                Error::Corruption(format!("{} references missing {}", key, missing))
            }
            other => other,
        })
    }

    /// Place, commit and clean up; caller holds the key latch
    fn commit_value(
        &self,
        key: &Key,
        value: NewValue,
        castime: CasTimeToken,
        txn: &mut TransactionContext,
    ) -> Result<Option<StoredValue>> {
        self.limits.check_value_size(value.len())?;
        let (descriptor, new_chain) = self.place(&value)?;

        match self
            .txn_manager
            .commit_write(txn, &*self.tree, key, descriptor, castime)
        {
            Ok(replaced) => {
                if let Some(old_chain) = replaced.as_ref().and_then(|s| s.descriptor.chain_id()) {
                    self.release_chain(old_chain);
                }
                Ok(replaced)
            }
            Err(e) => {
                if let Some(chain) = new_chain {
                    self.release_chain(chain);
                }
                Err(e.into())
            }
        }
    }

    /// Build the descriptor for `value`, filling a fresh chain if it is too
    /// large to inline
    fn place(&self, value: &NewValue) -> Result<(ValueDescriptor, Option<ChainId>)> {
        if self.limits.fits_inline(value.len()) {
            let descriptor = ValueDescriptor::inline(value.meta(), value.as_bytes(), &self.limits)?;
            return Ok((descriptor, None));
        }

        let mut lock = self.chains.allocate()?;
        let Some(chain) = lock.chain_id() else {
            return Err(Error::Corruption("allocated chain lock guards nothing".to_string()));
        };
        match lock.chain_mut() {
            Some(target) => target.overwrite(value.as_bytes(), self.limits.block_size),
            None => {
                drop(lock);
                self.release_chain(chain);
                return Err(Error::Corruption(format!("{} allocated without write access", chain)));
            }
        }
        drop(lock);

        match ValueDescriptor::chained(value.meta(), chain, value.len(), &self.limits) {
            Ok(descriptor) => Ok((descriptor, Some(chain))),
            Err(e) => {
                self.release_chain(chain);
                Err(e)
            }
        }
    }

    fn release_chain(&self, chain: ChainId) {
        if let Err(e) = self.chains.free(chain) {
            tracing::warn!(%chain, error = %e, "failed to free chain");
        }
    }
}

impl std::fmt::Debug for ModifyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifyExecutor")
            .field("limits", &self.limits)
            .field("latches", &self.latches)
            .finish()
    }
}
