//! The modify-operation contract
//!
//! A transform receives the current value of a key (or `None` if the key is
//! absent) and decides:
//! - **Accept**: replace the value with the returned [`NewValue`]
//! - **Reject**: leave the tree byte-for-byte unchanged
//!
//! Either way it reports a typed outcome back to the caller. The executor
//! guarantees the transform runs exactly once per operation, under the key's
//! latch, with any out-of-line chain read-locked for the duration.
//!
//! ## Rules for implementors
//!
//! - `operate` consumes the transform: one instance, one invocation.
//! - The returned value owns its bytes. Nothing borrowed from the old value
//!   may escape into it; the old value's lock is released before commit.
//! - No side effects on the tree. Everything flows through the result.
//! - Absence is not an error: the transform picks its own "not found"
//!   semantics.

use strata_core::value::{NewValue, ValueView};

/// Outcome of one transform invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformResult<O> {
    /// Replace the stored value
    Accept {
        /// Replacement value
        value: NewValue,
        /// Outcome reported to the caller
        outcome: O,
    },
    /// Leave the tree untouched
    Reject {
        /// Outcome reported to the caller
        outcome: O,
    },
}

impl<O> TransformResult<O> {
    /// Accept with `value`
    pub fn accept(value: NewValue, outcome: O) -> Self {
        TransformResult::Accept { value, outcome }
    }

    /// Reject
    pub fn reject(outcome: O) -> Self {
        TransformResult::Reject { outcome }
    }

    /// Whether the transform accepted
    pub fn is_accept(&self) -> bool {
        matches!(self, TransformResult::Accept { .. })
    }

    /// The outcome, whichever way the transform decided
    pub fn outcome(&self) -> &O {
        match self {
            TransformResult::Accept { outcome, .. } | TransformResult::Reject { outcome } => outcome,
        }
    }

    /// The replacement value, if accepted
    pub fn value(&self) -> Option<&NewValue> {
        match self {
            TransformResult::Accept { value, .. } => Some(value),
            TransformResult::Reject { .. } => None,
        }
    }
}

/// A read-then-conditionally-replace transform
///
/// Only [`IncrDecrOperation`](crate::IncrDecrOperation) ships with the
/// engine; other transforms (set, append, ...) belong to the command layer.
pub trait ModifyOperation {
    /// Typed result reported to the caller
    type Outcome;

    /// Short name used in log events
    fn name(&self) -> &'static str {
        "modify"
    }

    /// Decide the fate of `old_value`
    fn operate(self, old_value: Option<ValueView<'_>>) -> TransformResult<Self::Outcome>;
}

/// Transform built from a closure; see [`from_fn`]
pub struct FnOperation<F> {
    name: &'static str,
    f: F,
}

/// Wrap a closure as a [`ModifyOperation`]
///
/// ```
/// use strata_engine::modify::{from_fn, ModifyOperation, TransformResult};
///
/// let op = from_fn("exists", |old| TransformResult::<bool>::reject(old.is_some()));
/// assert_eq!(op.name(), "exists");
/// ```
pub fn from_fn<F, O>(name: &'static str, f: F) -> FnOperation<F>
where
    F: FnOnce(Option<ValueView<'_>>) -> TransformResult<O>,
{
    FnOperation { name, f }
}

impl<F, O> ModifyOperation for FnOperation<F>
where
    F: FnOnce(Option<ValueView<'_>>) -> TransformResult<O>,
{
    type Outcome = O;

    fn name(&self) -> &'static str {
        self.name
    }

    fn operate(self, old_value: Option<ValueView<'_>>) -> TransformResult<O> {
        (self.f)(old_value)
    }
}
