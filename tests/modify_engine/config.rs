//! Configuration Tests
//!
//! Stores can be configured in code or from a TOML file.

use crate::*;
use std::io::Write;
use stratakv::EngineConfig;

#[test]
fn test_builder_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
initial_cas = 9000
latch_stripes = 4

[limits]
max_in_node_value_size = 40
max_value_size = 1000
block_size = 8
"#
    )
    .unwrap();

    let kv = StrataKv::builder().config_file(file.path()).unwrap().open().unwrap();
    assert_eq!(kv.config().latch_stripes, 4);
    assert_eq!(kv.config().limits.max_in_node_value_size, 40);

    let token = kv.set("k", vec![b'x'; 41]).unwrap();
    assert_eq!(token.cas, 9001);
    assert_eq!(kv.engine().block_store().chain_count(), 1);
}

#[test]
fn test_inconsistent_limits_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "[limits]\nmax_in_node_value_size = 500\nmax_value_size = 100\n"
    )
    .unwrap();

    let err = StrataKv::builder().config_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_builder_validates_on_open() {
    let err = StrataKv::builder().block_size(0).open().unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = StrataKv::builder().max_in_node_value_size(10).open().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_open_with_config() {
    let config = EngineConfig::from_toml_str("initial_cas = 41").unwrap();
    let kv = StrataKv::open_with_config(config).unwrap();
    assert_eq!(kv.set("k", "v").unwrap().cas, 42);
}
