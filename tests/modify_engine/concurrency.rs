//! Concurrency Tests
//!
//! Operations on one key serialize; operations on different keys don't
//! interfere.

use crate::*;
use rand::Rng;
use std::sync::{Arc, Barrier};
use std::thread;

/// Two callers incrementing "0" must end at "2", never "1"
#[test]
fn test_two_concurrent_increments_both_apply() {
    for _ in 0..50 {
        let kv = create_store();
        kv.set("ctr", "0").unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let kv = kv.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    kv.incr("ctr", 1).unwrap()
                })
            })
            .collect();

        let mut outcomes: Vec<u64> = handles
            .into_iter()
            .map(|h| h.join().unwrap().value().unwrap())
            .collect();
        outcomes.sort_unstable();

        assert_eq!(outcomes, vec![1, 2]);
        assert_eq!(kv.get("ctr").unwrap().unwrap().value, b"2");
    }
}

#[test]
fn test_many_threads_sum_of_random_deltas() {
    let kv = create_store();
    kv.set("total", "0").unwrap();

    const NUM_THREADS: usize = 8;
    const OPS_PER_THREAD: usize = 200;

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let kv = kv.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                let deltas: Vec<u64> = (0..OPS_PER_THREAD).map(|_| rng.gen_range(1..=1000)).collect();
                barrier.wait();
                for delta in &deltas {
                    kv.incr("total", *delta).unwrap();
                }
                deltas.iter().sum::<u64>()
            })
        })
        .collect();

    let expected: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let stored = kv.get("total").unwrap().unwrap().value;
    assert_eq!(stored, expected.to_string().into_bytes());
}

#[test]
fn test_readers_never_see_partial_values() {
    let kv = create_small_inline_store();
    let a = vec![b'a'; 200];
    let b = vec![b'b'; 300];
    kv.set("blob", &a).unwrap();

    const NUM_READERS: usize = 4;
    let barrier = Arc::new(Barrier::new(NUM_READERS + 1));

    let writer = {
        let kv = kv.clone();
        let barrier = Arc::clone(&barrier);
        let (a, b) = (a.clone(), b.clone());
        thread::spawn(move || {
            barrier.wait();
            for i in 0..200 {
                kv.set("blob", if i % 2 == 0 { &b } else { &a }).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..NUM_READERS)
        .map(|_| {
            let kv = kv.clone();
            let barrier = Arc::clone(&barrier);
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    let value = kv.get("blob").unwrap().unwrap().value;
                    assert!(value == a || value == b, "torn read of {} bytes", value.len());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for h in readers {
        h.join().unwrap();
    }
    assert_eq!(kv.engine().block_store().chain_count(), 1);
}

#[test]
fn test_independent_keys() {
    let kv = create_store();
    const NUM_THREADS: usize = 8;
    const OPS_PER_THREAD: u64 = 100;

    for i in 0..NUM_THREADS {
        kv.set(format!("ctr_{}", i), "0").unwrap();
    }

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let kv = kv.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let key = format!("ctr_{}", i);
                for _ in 0..OPS_PER_THREAD {
                    kv.incr(&key, 1).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    for i in 0..NUM_THREADS {
        let value = kv.get(format!("ctr_{}", i)).unwrap().unwrap().value;
        assert_eq!(value, OPS_PER_THREAD.to_string().into_bytes(), "ctr_{}", i);
    }
}
