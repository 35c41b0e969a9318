//! Modify Engine Test Suite
//!
//! End-to-end tests through the `StrataKv` facade:
//!
//! 1. Counter semantics (saturation, not-found, not-numeric)
//! 2. Rejections leave stored bytes and tokens untouched
//! 3. Out-of-line (chained) values
//! 4. Per-key linearizability under concurrency
//! 5. Transaction conflicts and external aborts
//! 6. Configuration loading
//! 7. Random counter sequences against a saturating-arithmetic model
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test modify_engine
//!
//! # Concurrency tests only
//! cargo test --test modify_engine concurrency::
//! ```

use stratakv::prelude::*;

pub mod chained;
pub mod concurrency;
pub mod config;
pub mod custom_transforms;
pub mod model;
pub mod transactions;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Route engine logs to the test harness output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Create an in-memory store with default settings
pub fn create_store() -> StrataKv {
    init_tracing();
    StrataKv::ephemeral().expect("Failed to create store")
}

/// Create a store whose inline bound is small enough to exercise chains
pub fn create_small_inline_store() -> StrataKv {
    init_tracing();
    StrataKv::builder()
        .max_in_node_value_size(32)
        .max_value_size(4096)
        .block_size(16)
        .open()
        .expect("Failed to create store")
}

/// Stored bytes and token of `key`, panicking if absent
pub fn snapshot(kv: &StrataKv, key: &str) -> (Vec<u8>, CasTimeToken) {
    let found = kv.get(key).unwrap().expect("key should exist");
    (found.value, found.castime)
}
