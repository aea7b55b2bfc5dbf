use crate::invariants::debug_assert_index_in_bounds;
use crate::link::{AtomicLink, Link, NIL};
use crate::sync::{AtomicU32, Ordering};
use crate::Backoff;
use crossbeam_utils::CachePadded;

// =============================================================================
// MEMORY ORDERING
// =============================================================================
//
// Treiber stack over a fixed arena of indices.
//
// **push(i):** write `next[i] = head.index` (Relaxed), then CAS head to `i`
// with Release. Whatever the pushing thread did to element `i` before the
// push (moving a payload out) is published with it.
//
// **pop():** load head with Acquire, read `next[head]` (Relaxed; made visible
// by the Acquire), CAS head to `next` with Acquire. A stale `next` read from
// a node that was popped and re-pushed meanwhile is rejected by the tag.
// =============================================================================

/// Lock-free LIFO pool of arena indices.
///
/// Indices are in `0..capacity`. Each index may be linked at most once; the
/// caller guarantees it only pushes indices it exclusively holds.
pub struct Freelist {
    head: CachePadded<AtomicLink>,
    next: Box<[AtomicU32]>,
}

impl Freelist {
    /// Creates an empty freelist able to link indices `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        let next = (0..capacity).map(|_| AtomicU32::new(NIL)).collect();
        Self {
            head: CachePadded::new(AtomicLink::new(Link::nil(0))),
            next,
        }
    }

    /// Number of indices this freelist can link.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.next.len()
    }

    /// Returns `index` to the pool.
    pub fn push(&self, index: u32) {
        debug_assert_index_in_bounds!(index, self.next.len());

        let mut backoff = Backoff::new();
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            self.next[index as usize].store(head.index(), Ordering::Relaxed);
            match self.head.compare_exchange_weak(
                head,
                head.retag(index),
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(current) => {
                    head = current;
                    backoff.spin();
                }
            }
        }
    }

    /// Takes an index from the pool, or `None` if it is empty.
    pub fn pop(&self) -> Option<u32> {
        let mut backoff = Backoff::new();
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            if head.is_nil() {
                return None;
            }
            let next = self.next[head.index() as usize].load(Ordering::Relaxed);
            match self.head.compare_exchange_weak(
                head,
                head.retag(next),
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(head.index()),
                Err(current) => {
                    head = current;
                    backoff.spin();
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // QUIESCENT INSPECTION (no concurrent push/pop)
    // ---------------------------------------------------------------------

    #[inline]
    pub(crate) fn head_index(&self) -> u32 {
        self.head.load(Ordering::Acquire).index()
    }

    #[inline]
    pub(crate) fn next_of(&self, index: u32) -> u32 {
        self.next[index as usize].load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Freelist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Freelist")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
