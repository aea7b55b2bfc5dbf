use crate::invariants::{debug_assert_detached, debug_assert_index_in_bounds};
use crate::link::{AtomicLink, Link, NIL};
use crate::sync::{AtomicU32, Ordering};
use crate::Backoff;
use crossbeam_utils::CachePadded;

// =============================================================================
// UNBOUNDED MINIMAL MEMORY QUEUE
// =============================================================================
//
// Michael-Scott queue over a fixed node arena. The queue always holds one
// dummy node at the head; the element carried by a node is logically the
// *next* node's element. Consequences the ring buffer relies on:
//
// - `dequeue` hands back the old dummy node, not the node that carried the
//   element. The caller adopts that node for its next `enqueue`, so node
//   ownership rotates between elements.
// - N nodes hold at most N - 1 elements.
//
// ## Memory Ordering
//
// **enqueue:** element id and `next = nil` are written Relaxed, then the
// node is linked by a Release CAS on the predecessor's `next`.
//
// **dequeue:** `next` is loaded with Acquire (synchronizes with the linking
// CAS), the element id is read, then head is swung with an AcqRel CAS. The
// element id may be stale if the node was recycled; the head CAS then fails.
//
// Head, tail and every `next` are tagged links (see `link.rs`).
// =============================================================================

struct Node {
    next: AtomicLink,
    element: AtomicU32,
}

/// What a successful [`UmmQueue::dequeue`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dequeued {
    /// Node released by the queue (the old dummy). Now owned by the caller.
    pub node: u32,
    /// Element id carried by the entry that was removed.
    pub element: u32,
}

/// Lock-free FIFO of element ids over a fixed node arena.
pub struct UmmQueue {
    head: CachePadded<AtomicLink>,
    tail: CachePadded<AtomicLink>,
    nodes: Box<[Node]>,
}

impl UmmQueue {
    /// Creates an empty queue of `node_count` nodes anchored on `dummy`.
    ///
    /// Nodes other than `dummy` belong to the caller until enqueued.
    pub fn new(node_count: usize, dummy: u32) -> Self {
        debug_assert_index_in_bounds!(dummy, node_count);

        let nodes = (0..node_count)
            .map(|_| Node {
                next: AtomicLink::new(Link::nil(0)),
                element: AtomicU32::new(NIL),
            })
            .collect();
        Self {
            head: CachePadded::new(AtomicLink::new(Link::new(dummy, 0))),
            tail: CachePadded::new(AtomicLink::new(Link::new(dummy, 0))),
            nodes,
        }
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Appends `element` at the tail using `node`, which the caller owns.
    pub fn enqueue(&self, node: u32, element: u32) {
        debug_assert_index_in_bounds!(node, self.nodes.len());

        let slot = &self.nodes[node as usize];
        slot.element.store(element, Ordering::Relaxed);
        let stale = slot.next.load(Ordering::Relaxed);
        slot.next.store(Link::nil(stale.tag().wrapping_add(1)), Ordering::Relaxed);

        let mut backoff = Backoff::new();
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let next = self.nodes[tail.index() as usize].next.load(Ordering::Acquire);

            if tail != self.tail.load(Ordering::Acquire) {
                backoff.spin();
                continue;
            }

            if next.is_nil() {
                debug_assert_detached!(node, tail.index());
                let linked = self.nodes[tail.index() as usize].next.compare_exchange_weak(
                    next,
                    next.retag(node),
                    Ordering::Release,
                    Ordering::Relaxed,
                );
                if linked.is_ok() {
                    // Swing tail; failure means another thread already helped.
                    let _ = self.tail.compare_exchange(
                        tail,
                        tail.retag(node),
                        Ordering::Release,
                        Ordering::Relaxed,
                    );
                    return;
                }
            } else {
                // Tail is lagging: help it forward.
                let _ = self.tail.compare_exchange(
                    tail,
                    tail.retag(next.index()),
                    Ordering::Release,
                    Ordering::Relaxed,
                );
            }
            backoff.spin();
        }
    }

    /// Removes the oldest element, or returns `None` if the queue is empty.
    pub fn dequeue(&self) -> Option<Dequeued> {
        let mut backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Acquire);
            let next = self.nodes[head.index() as usize].next.load(Ordering::Acquire);

            if head != self.head.load(Ordering::Acquire) {
                backoff.spin();
                continue;
            }

            if head.index() == tail.index() {
                if next.is_nil() {
                    return None;
                }
                // Tail is lagging behind a completed link: help it forward.
                let _ = self.tail.compare_exchange(
                    tail,
                    tail.retag(next.index()),
                    Ordering::Release,
                    Ordering::Relaxed,
                );
            } else if !next.is_nil() {
                let element = self.nodes[next.index() as usize].element.load(Ordering::Relaxed);
                if self
                    .head
                    .compare_exchange_weak(
                        head,
                        head.retag(next.index()),
                        Ordering::AcqRel,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    return Some(Dequeued {
                        node: head.index(),
                        element,
                    });
                }
            }
            backoff.spin();
        }
    }

    // ---------------------------------------------------------------------
    // QUIESCENT INSPECTION (no concurrent enqueue/dequeue)
    // ---------------------------------------------------------------------

    #[inline]
    pub(crate) fn head_index(&self) -> u32 {
        self.head.load(Ordering::Acquire).index()
    }

    #[inline]
    pub(crate) fn tail_index(&self) -> u32 {
        self.tail.load(Ordering::Acquire).index()
    }

    #[inline]
    pub(crate) fn next_of(&self, node: u32) -> u32 {
        self.nodes[node as usize].next.load(Ordering::Acquire).index()
    }

    #[inline]
    pub(crate) fn element_of(&self, node: u32) -> u32 {
        self.nodes[node as usize].element.load(Ordering::Acquire)
    }

    /// Counts queued elements by walking from the head, stopping after
    /// `node_count` steps if the links loop.
    pub(crate) fn count_quiescent(&self) -> usize {
        let mut count = 0;
        let mut node = self.next_of(self.head_index());
        while node != NIL && (node as usize) < self.nodes.len() && count < self.nodes.len() {
            count += 1;
            node = self.next_of(node);
        }
        count
    }

    // Direct link surgery for validation tests.

    #[cfg(all(test, not(feature = "loom")))]
    pub(crate) fn set_next(&self, node: u32, next: u32) {
        let link = self.nodes[node as usize].next.load(Ordering::Relaxed);
        self.nodes[node as usize]
            .next
            .store(link.retag(next), Ordering::Relaxed);
    }

    #[cfg(all(test, not(feature = "loom")))]
    pub(crate) fn set_element(&self, node: u32, element: u32) {
        self.nodes[node as usize]
            .element
            .store(element, Ordering::Relaxed);
    }

    #[cfg(all(test, not(feature = "loom")))]
    pub(crate) fn set_tail(&self, node: u32) {
        let link = self.tail.load(Ordering::Relaxed);
        self.tail.store(link.retag(node), Ordering::Relaxed);
    }
}

impl std::fmt::Debug for UmmQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmmQueue")
            .field("node_count", &self.node_count())
            .finish_non_exhaustive()
    }
}
