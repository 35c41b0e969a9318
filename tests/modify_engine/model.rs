//! Model-based Counter Tests
//!
//! Random incr/decr sequences checked against plain saturating-to-zero
//! arithmetic on a `u64`.

use crate::*;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Step {
    Incr(u64),
    Decr(u64),
}

fn delta() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 0u64..1_000,
        1 => Just(u64::MAX),
        1 => any::<u64>(),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![delta().prop_map(Step::Incr), delta().prop_map(Step::Decr)]
}

fn model_apply(value: u64, step: Step) -> u64 {
    match step {
        Step::Incr(d) => value.checked_add(d).unwrap_or(0),
        Step::Decr(d) => value.checked_sub(d).unwrap_or(0),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_counter_matches_model(start in any::<u64>(), steps in prop::collection::vec(step(), 1..40)) {
        let kv = create_store();
        kv.set("ctr", start.to_string()).unwrap();
        let mut model = start;
        let mut last_cas = kv.get("ctr").unwrap().unwrap().castime.cas;

        for step in steps {
            let outcome = match step {
                Step::Incr(d) => kv.incr("ctr", d).unwrap(),
                Step::Decr(d) => kv.decr("ctr", d).unwrap(),
            };
            model = model_apply(model, step);

            prop_assert_eq!(outcome, CounterOutcome::Success(model));
            let stored = kv.get("ctr").unwrap().unwrap();
            prop_assert_eq!(stored.value, model.to_string().into_bytes());
            prop_assert!(stored.castime.cas > last_cas);
            last_cas = stored.castime.cas;
        }
    }

    #[test]
    fn prop_non_numeric_never_modified(text in "[a-z ]{1,20}|-[0-9]{1,5}", steps in prop::collection::vec(step(), 1..10)) {
        let kv = create_store();
        kv.set("txt", &text).unwrap();
        let before = snapshot(&kv, "txt");

        for step in steps {
            let outcome = match step {
                Step::Incr(d) => kv.incr("txt", d).unwrap(),
                Step::Decr(d) => kv.decr("txt", d).unwrap(),
            };
            prop_assert_eq!(outcome, CounterOutcome::NotNumeric);
        }
        prop_assert_eq!(snapshot(&kv, "txt"), before);
    }
}
