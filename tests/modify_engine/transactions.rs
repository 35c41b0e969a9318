//! Transaction Tests
//!
//! Conflicts and aborts are errors distinct from transform rejections.

use crate::*;

#[test]
fn test_multiple_updates_in_one_transaction() {
    let kv = create_store();
    kv.set("a", "1").unwrap();
    kv.set("b", "10").unwrap();

    let mut txn = kv.begin();
    kv.counter_update("a", Direction::Increment, 1, &mut txn).unwrap();
    kv.counter_update("b", Direction::Decrement, 1, &mut txn).unwrap();
    kv.counter_update("a", Direction::Increment, 1, &mut txn).unwrap();
    kv.commit(&mut txn).unwrap();

    assert_eq!(txn.status(), TransactionStatus::Committed);
    assert_eq!(kv.get("a").unwrap().unwrap().value, b"3");
    assert_eq!(kv.get("b").unwrap().unwrap().value, b"9");
}

#[test]
fn test_stale_read_is_conflict() {
    let kv = create_store();
    kv.set("a", "1").unwrap();
    kv.set("b", "1").unwrap();

    let mut txn = kv.begin();
    // Reads "a" (rejected: nothing written, but the read is recorded)
    let peek = from_fn("peek", |old: Option<ValueView<'_>>| TransformResult::reject(old.is_some()));
    assert!(kv.apply_modify("a", peek, &mut txn).unwrap());

    // Another caller changes "a"
    kv.incr("a", 1).unwrap();

    let before = snapshot(&kv, "b");
    let err = kv
        .counter_update("b", Direction::Increment, 1, &mut txn)
        .unwrap_err();
    assert!(err.is_conflict(), "expected conflict, got {}", err);
    assert!(err.is_retryable());
    assert_eq!(snapshot(&kv, "b"), before);
}

#[test]
fn test_commit_after_overtaken_write_applies_once() {
    let kv = create_store();
    kv.set("ctr", "1").unwrap();

    let mut txn = kv.begin();
    assert_eq!(
        kv.counter_update("ctr", Direction::Increment, 1, &mut txn).unwrap(),
        CounterOutcome::Success(2)
    );
    // Another caller increments after our write landed
    kv.incr("ctr", 1).unwrap();

    kv.commit(&mut txn).unwrap();
    assert_eq!(txn.status(), TransactionStatus::Committed);
    assert_eq!(kv.get("ctr").unwrap().unwrap().value, b"3");
}

#[test]
fn test_read_only_commit_detects_conflict() {
    let kv = create_store();
    kv.set("a", "1").unwrap();

    let mut txn = kv.begin();
    let peek = from_fn("peek", |old: Option<ValueView<'_>>| TransformResult::reject(old.is_some()));
    assert!(kv.apply_modify("a", peek, &mut txn).unwrap());
    kv.incr("a", 1).unwrap();

    let err = kv.commit(&mut txn).unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(txn.status(), TransactionStatus::Aborted { .. }));
    assert_eq!(kv.get("a").unwrap().unwrap().value, b"2");
}

#[test]
fn test_retrying_conflicted_operation_applies_once() {
    let kv = create_store();
    kv.set("a", "1").unwrap();
    kv.set("b", "10").unwrap();

    let mut txn = kv.begin();
    let peek = from_fn("peek", |_: Option<ValueView<'_>>| TransformResult::reject(()));
    kv.apply_modify("a", peek, &mut txn).unwrap();
    kv.incr("a", 1).unwrap();

    let err = kv.counter_update("b", Direction::Increment, 5, &mut txn).unwrap_err();
    assert!(err.is_retryable());

    // The failed step wrote nothing, so retrying it in a fresh transaction
    // applies the update exactly once
    let mut retry = kv.begin();
    kv.counter_update("b", Direction::Increment, 5, &mut retry).unwrap();
    kv.commit(&mut retry).unwrap();
    assert_eq!(kv.get("b").unwrap().unwrap().value, b"15");
}

#[test]
fn test_external_abort_is_not_active() {
    let kv = create_store();
    kv.set("ctr", "5").unwrap();
    let before = snapshot(&kv, "ctr");

    let mut txn = kv.begin();
    let handle = txn.abort_handle();
    let aborter = std::thread::spawn(move || handle.abort("operator cancelled"));
    assert!(aborter.join().unwrap());

    let err = kv
        .counter_update("ctr", Direction::Increment, 1, &mut txn)
        .unwrap_err();
    assert!(matches!(err, Error::TransactionNotActive { .. }));
    assert_eq!(snapshot(&kv, "ctr"), before);
}

#[test]
fn test_abort_mid_transform_discards_value() {
    let kv = create_store();
    kv.set("ctr", "5").unwrap();
    let before = snapshot(&kv, "ctr");

    let mut txn = kv.begin();
    let handle = txn.abort_handle();
    let op = from_fn("cancelled", move |old: Option<ValueView<'_>>| {
        handle.abort("deadline");
        TransformResult::accept(old.expect("present").with_bytes(b"6"), ())
    });

    let err = kv.apply_modify("ctr", op, &mut txn).unwrap_err();
    assert!(matches!(err, Error::TransactionNotActive { .. }));
    assert_eq!(snapshot(&kv, "ctr"), before);
}

#[test]
fn test_finished_transaction_rejects_work() {
    let kv = create_store();
    kv.set("a", "1").unwrap();

    let mut txn = kv.begin();
    kv.commit(&mut txn).unwrap();

    let err = kv.counter_update("a", Direction::Increment, 1, &mut txn).unwrap_err();
    assert!(matches!(err, Error::TransactionNotActive { .. }));
    assert!(kv.abort(&mut txn, "late").is_err());
}
