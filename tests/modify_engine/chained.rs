//! Out-of-line Value Tests
//!
//! Values above the inline bound live in block chains. They are read through
//! the chain lock and never parse as counters.

use crate::*;

#[test]
fn test_large_value_round_trip() {
    let kv = create_small_inline_store();
    let payload: Vec<u8> = (0..200u32).map(|i| (i % 251) as u8).collect();

    kv.set("blob", &payload).unwrap();
    assert_eq!(kv.get("blob").unwrap().unwrap().value, payload);
    assert_eq!(kv.engine().block_store().chain_count(), 1);
}

#[test]
fn test_chained_digits_not_numeric() {
    let kv = create_small_inline_store();
    let digits = "9".repeat(40);
    kv.set("big", &digits).unwrap();
    let before = snapshot(&kv, "big");

    assert_eq!(kv.incr("big", 1).unwrap(), CounterOutcome::NotNumeric);
    assert_eq!(snapshot(&kv, "big"), before);
}

#[test]
fn test_overwrite_and_delete_release_chains() {
    let kv = create_small_inline_store();
    kv.set("blob", vec![1u8; 100]).unwrap();
    kv.set("blob", vec![2u8; 300]).unwrap();
    assert_eq!(kv.engine().block_store().chain_count(), 1);
    assert_eq!(kv.get("blob").unwrap().unwrap().value, vec![2u8; 300]);

    assert!(kv.delete("blob").unwrap());
    assert_eq!(kv.engine().block_store().chain_count(), 0);
    assert!(kv.get("blob").unwrap().is_none());
}

#[test]
fn test_value_too_large_rejected() {
    let kv = create_small_inline_store();
    let err = kv.set("huge", vec![0u8; 4097]).unwrap_err();

    assert!(matches!(err, Error::ValueTooLarge { size: 4097, max: 4096 }));
    assert!(kv.get("huge").unwrap().is_none());
    assert_eq!(kv.engine().block_store().chain_count(), 0);
}

#[test]
fn test_transform_growing_value_moves_out_of_line() {
    let kv = create_small_inline_store();
    kv.set("s", "seed").unwrap();

    let mut txn = kv.begin();
    let op = from_fn("grow", |old: Option<ValueView<'_>>| {
        let old = old.expect("seeded");
        let mut grown = old.bytes().into_owned();
        grown.extend(std::iter::repeat(b'!').take(60));
        TransformResult::accept(old.with_bytes(grown), ())
    });
    kv.apply_modify("s", op, &mut txn).unwrap();
    kv.commit(&mut txn).unwrap();

    let found = kv.get("s").unwrap().unwrap();
    assert_eq!(found.value.len(), 64);
    assert!(found.value.starts_with(b"seed"));
    assert_eq!(kv.engine().block_store().chain_count(), 1);
}
