//! Property-based tests: the ring buffer, driven single-threaded, must behave
//! exactly like a bounded `VecDeque` that drops its front when full.

#![cfg(not(feature = "loom"))]

use proptest::prelude::*;
use ringover_rs::{Config, Disposition, RingBuffer, ValidationInfo};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    Write(u32),
    Read,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u32>().prop_map(Op::Write),
        2 => Just(Op::Read),
    ]
}

// =============================================================================
// Model equivalence
// =============================================================================

proptest! {
    /// Every write/read result matches the bounded-deque model.
    #[test]
    fn prop_matches_bounded_deque(
        capacity in 1usize..12,
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let ring = RingBuffer::<u32, u32>::new(Config::with_slots(capacity)).unwrap();
        let mut model: VecDeque<u32> = VecDeque::with_capacity(capacity);

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Write(v) => {
                    let expected = if model.len() == capacity { model.pop_front() } else { None };
                    model.push_back(v);
                    let got = ring.write(v, !v).map(|(k, _)| k);
                    prop_assert_eq!(got, expected, "write mismatch at step {}", step);
                }
                Op::Read => {
                    let got = ring.read();
                    let expected = model.pop_front().map(|v| (v, !v));
                    prop_assert_eq!(got, expected, "read mismatch at step {}", step);
                }
            }
        }
    }
}

// =============================================================================
// Capacity invariant
// =============================================================================

proptest! {
    /// freelist + queue == capacity after every operation, and the queued
    /// count never exceeds capacity.
    #[test]
    fn prop_capacity_invariant(
        capacity in 1usize..10,
        ops in prop::collection::vec(op(), 0..100),
    ) {
        let mut ring = RingBuffer::<u32, ()>::new(Config::with_slots(capacity)).unwrap();

        for op in ops {
            match op {
                Op::Write(v) => { ring.write(v, ()); }
                Op::Read => { ring.read(); }
            }
            let count = ring.count();
            prop_assert!(count <= capacity, "count {} > capacity {}", count, capacity);
            prop_assert_eq!(ring.validate(Some(ValidationInfo::exactly(count))), Ok(()));
        }
    }
}

// =============================================================================
// Overwrite counting
// =============================================================================

proptest! {
    /// Writing n values into capacity k reports exactly max(0, n - k) overwrites.
    #[test]
    fn prop_overwrite_count(
        capacity in 1usize..32,
        writes in 0usize..100,
    ) {
        let ring = RingBuffer::<usize, ()>::new(Config::with_slots(capacity)).unwrap();
        let overwrites = (0..writes).filter(|&i| ring.write(i, ()).is_some()).count();
        prop_assert_eq!(overwrites, writes.saturating_sub(capacity));
    }
}

// =============================================================================
// Cleanup accounting
// =============================================================================

proptest! {
    /// Cleanup calls back once per usable element, unread exactly for the
    /// queued ones.
    #[test]
    fn prop_cleanup_visits_each_once(
        capacity in 1usize..16,
        ops in prop::collection::vec(op(), 0..60),
    ) {
        let mut ring = RingBuffer::<u32, ()>::new(Config::with_slots(capacity)).unwrap();
        for op in ops {
            match op {
                Op::Write(v) => { ring.write(v, ()); }
                Op::Read => { ring.read(); }
            }
        }
        let queued = ring.count();

        let (mut unread, mut drained) = (0, 0);
        ring.cleanup(|_, d| match d {
            Disposition::Unread { .. } => unread += 1,
            Disposition::Drained => drained += 1,
        });
        prop_assert_eq!(unread, queued);
        prop_assert_eq!(unread + drained, capacity);
    }
}
