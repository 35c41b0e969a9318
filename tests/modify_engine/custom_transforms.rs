//! Custom Transform Tests
//!
//! Any `ModifyOperation` runs through the same atomic path as counters.

use crate::*;

/// Appends a suffix to an existing value; missing keys are left absent
struct Append(&'static [u8]);

impl ModifyOperation for Append {
    type Outcome = Option<usize>;

    fn name(&self) -> &'static str {
        "append"
    }

    fn operate(self, old: Option<ValueView<'_>>) -> TransformResult<Option<usize>> {
        let Some(old) = old else {
            return TransformResult::reject(None);
        };
        let mut bytes = old.bytes().into_owned();
        bytes.extend_from_slice(self.0);
        let len = bytes.len();
        TransformResult::accept(old.with_bytes(bytes), Some(len))
    }
}

#[test]
fn test_append_transform() {
    let kv = create_store();
    kv.set("greeting", "hello").unwrap();

    let mut txn = kv.begin();
    let outcome = kv.apply_modify("greeting", Append(b", world"), &mut txn).unwrap();
    kv.commit(&mut txn).unwrap();

    assert_eq!(outcome, Some(12));
    assert_eq!(kv.get("greeting").unwrap().unwrap().value, b"hello, world");
}

#[test]
fn test_append_to_missing_creates_nothing() {
    let kv = create_store();

    let mut txn = kv.begin();
    assert_eq!(kv.apply_modify("nothing", Append(b"x"), &mut txn).unwrap(), None);
    assert!(kv.get("nothing").unwrap().is_none());
}

#[test]
fn test_closure_transform_sees_metadata() {
    let kv = create_store();
    kv.set_with_meta("k", "v", ValueMeta::with_flags(7)).unwrap();

    let mut txn = kv.begin();
    let flags = kv
        .apply_modify(
            "k",
            from_fn("flags", |old: Option<ValueView<'_>>| {
                TransformResult::reject(old.map(|v| v.meta().flags))
            }),
            &mut txn,
        )
        .unwrap();
    assert_eq!(flags, Some(7));
}

#[test]
fn test_invalid_key_rejected() {
    let kv = create_store();
    assert!(matches!(kv.incr("", 1), Err(Error::InvalidKey(_))));
    assert!(matches!(kv.set("k".repeat(251), "v"), Err(Error::InvalidKey(_))));
}
