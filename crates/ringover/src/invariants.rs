//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.
//!
//! Used by `Freelist`, `UmmQueue` and `RingBuffer`.

// =============================================================================
// Arena bounds
// =============================================================================

/// Assert that an arena index refers to an existing slot.
///
/// Used in: `Freelist::push()`, `UmmQueue::enqueue()`
macro_rules! debug_assert_index_in_bounds {
    ($index:expr, $len:expr) => {
        debug_assert!(
            ($index as usize) < $len,
            "arena index {} out of bounds (len {})",
            $index,
            $len
        )
    };
}

// =============================================================================
// Reserved element
// =============================================================================

/// Assert that the element whose queue node anchors the empty queue is never
/// handed to the freelist or the queue as a payload carrier.
///
/// Used in: `RingBuffer::release()`, `RingBuffer::publish()`
macro_rules! debug_assert_not_reserved {
    ($index:expr, $reserved:expr) => {
        debug_assert!(
            $index != $reserved,
            "reserved element {} used as a payload carrier",
            $index
        )
    };
}

// =============================================================================
// Conservation
// =============================================================================

/// Assert that teardown accounted for every usable element exactly once.
///
/// **Invariant**: `unread + drained == number_elements - 1`
///
/// Used in: `RingBuffer::cleanup()`
macro_rules! debug_assert_conserved {
    ($unread:expr, $drained:expr, $capacity:expr) => {
        debug_assert!(
            $unread + $drained == $capacity,
            "cleanup visited {} unread + {} drained elements, expected {}",
            $unread,
            $drained,
            $capacity
        )
    };
}

// =============================================================================
// Queue node detachment
// =============================================================================

/// Assert that a node being enqueued is not the current queue tail.
///
/// A node released by `dequeue` is the old dummy, which the head has already
/// moved past, so it can never still be the tail.
///
/// Used in: `UmmQueue::enqueue()`
macro_rules! debug_assert_detached {
    ($node:expr, $tail:expr) => {
        debug_assert!(
            $node != $tail,
            "enqueueing node {} which is still the queue tail",
            $node
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_conserved;
pub(crate) use debug_assert_detached;
pub(crate) use debug_assert_index_in_bounds;
pub(crate) use debug_assert_not_reserved;
