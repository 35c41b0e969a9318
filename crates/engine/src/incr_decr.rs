//! Increment/decrement transform
//!
//! Treats the stored value as an unsigned decimal counter.
//!
//! | Stored value | Outcome | Tree |
//! |--------------|---------|------|
//! | absent | `NotFound` | unchanged |
//! | not a decimal `u64` (or 50+ bytes) | `NotNumeric` | unchanged |
//! | `n` | `Success(n ± delta)` | new decimal, same flags |
//!
//! Overflow on increment and underflow on decrement both set the counter to
//! 0. That is memcached's documented behaviour (as of 1.4.5) and clients rely
//! on it; do not switch to wrapping or clamping to the maximum.

use crate::modify::{ModifyOperation, TransformResult};
use strata_core::codec::{self, MAX_U64_DECIMAL_LEN, NUMERIC_PARSE_CAP};
use strata_core::value::ValueView;

/// Counter direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Add the delta
    Increment,
    /// Subtract the delta
    Decrement,
}

/// Result of a counter update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterOutcome {
    /// Key absent; nothing written
    NotFound,
    /// Value is not an unsigned decimal; nothing written
    NotNumeric,
    /// Value updated to the contained number
    Success(u64),
}

impl CounterOutcome {
    /// The new counter value, if the update succeeded
    pub fn value(&self) -> Option<u64> {
        match self {
            CounterOutcome::Success(n) => Some(*n),
            _ => None,
        }
    }
}

/// Saturating-to-zero counter arithmetic on a decimal value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrDecrOperation {
    direction: Direction,
    delta: u64,
}

impl IncrDecrOperation {
    /// Create a counter update
    pub fn new(direction: Direction, delta: u64) -> Self {
        Self { direction, delta }
    }

    /// Increment by `delta`
    pub fn increment(delta: u64) -> Self {
        Self::new(Direction::Increment, delta)
    }

    /// Decrement by `delta`
    pub fn decrement(delta: u64) -> Self {
        Self::new(Direction::Decrement, delta)
    }

    /// Direction of this update
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Amount of this update
    pub fn delta(&self) -> u64 {
        self.delta
    }

    /// Apply the update to `number`; overflow and underflow give 0
    pub fn apply(&self, number: u64) -> u64 {
        match self.direction {
            Direction::Increment => number.checked_add(self.delta).unwrap_or(0),
            Direction::Decrement => number.checked_sub(self.delta).unwrap_or(0),
        }
    }
}

fn parse_counter(value: &ValueView<'_>) -> Option<u64> {
    if value.len() >= NUMERIC_PARSE_CAP {
        return None;
    }
    let mut scratch = [0u8; NUMERIC_PARSE_CAP];
    let n = value.copy_prefix(&mut scratch);
    codec::parse(&scratch[..n])
}

impl ModifyOperation for IncrDecrOperation {
    type Outcome = CounterOutcome;

    fn name(&self) -> &'static str {
        match self.direction {
            Direction::Increment => "incr",
            Direction::Decrement => "decr",
        }
    }

    fn operate(self, old_value: Option<ValueView<'_>>) -> TransformResult<CounterOutcome> {
        let Some(old_value) = old_value else {
            return TransformResult::reject(CounterOutcome::NotFound);
        };

        let Some(number) = parse_counter(&old_value) else {
            return TransformResult::reject(CounterOutcome::NotNumeric);
        };

        let updated = self.apply(number);
        let encoded = codec::format(updated);
        debug_assert!(encoded.len() <= MAX_U64_DECIMAL_LEN);

        TransformResult::accept(
            old_value.with_bytes(encoded),
            CounterOutcome::Success(updated),
        )
    }
}
