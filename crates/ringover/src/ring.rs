use crate::invariants::{debug_assert_conserved, debug_assert_not_reserved};
use crate::query::{self, Query, QueryOutput, ValidationInfo};
use crate::queue::Dequeued;
use crate::sync::{AtomicU32, Ordering};
use crate::{
    Backoff, Config, ConfigError, Freelist, Metrics, MetricsSnapshot, UmmQueue, ValidationError,
};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

// =============================================================================
// OWNERSHIP PROTOCOL
// =============================================================================
//
// Every usable element is, at any instant, in exactly one of three places:
//
// - linked in the freelist (payload uninitialized),
// - linked in the queue (payload initialized, unread),
// - held by the single thread that just popped/dequeued it.
//
// Only the holding thread touches the element's `payload` or `queue_node`.
// Hand-off happens through the freelist/queue CASes, whose Release/Acquire
// pairs order the payload write in `write` before the payload read in
// `read` (or in a stealing `write`).
//
// ## Queue node rotation
//
// The queue needs one dummy node, so element 0's queue node is given to it
// at construction and element 0 never carries a payload. `dequeue` returns
// the old dummy node rather than the node that carried the element; the
// element adopts that node as the one it will use on its next enqueue.
//
// ## Write path
//
// 1. Pop the freelist. Got one: fill payload, enqueue. No overwrite.
// 2. Freelist empty (ring full): dequeue the oldest element, move its payload
//    out for the caller, fill the new payload, enqueue at the tail.
// 3. Both empty: every element is in flight in some other thread's read or
//    write. Back off and retry; that thread finishes in a bounded number of
//    its own steps.
// =============================================================================

/// Element reserved for the queue's initial dummy node.
const RESERVED: u32 = 0;

struct Element<K, V> {
    /// Queue node this element uses on its next enqueue.
    queue_node: AtomicU32,
    payload: UnsafeCell<MaybeUninit<(K, V)>>,
}

/// How an element was found during [`RingBuffer::cleanup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition<K, V> {
    /// Written and never read; ownership of the payload passes to the callback.
    Unread { key: K, value: V },
    /// Free slot with no live payload.
    Drained,
}

impl<K, V> Disposition<K, V> {
    /// True if the element still held an entry nobody read.
    #[inline]
    pub fn is_unread(&self) -> bool {
        matches!(self, Self::Unread { .. })
    }
}

/// Lock-free, fixed-capacity, overwrite-on-full ring buffer.
///
/// Any number of threads may call [`write`](Self::write) and
/// [`read`](Self::read) concurrently through a shared reference. When full,
/// `write` discards the oldest unread entry and hands it back to the caller.
///
/// Composed from a [`Freelist`] of empty elements and a [`UmmQueue`] of
/// written ones; both are lock-free, so neither operation ever blocks.
pub struct RingBuffer<K, V, S = ()> {
    elements: Box<[Element<K, V>]>,
    freelist: Freelist,
    queue: UmmQueue,
    metrics: Metrics,
    config: Config,
    user_state: S,
}

// Safety: payloads are only touched by the thread holding the element (see
// OWNERSHIP PROTOCOL), and moved between threads by write/read, so K and V
// must be Send. `user_state` is handed out by shared reference.
unsafe impl<K: Send, V: Send, S: Send> Send for RingBuffer<K, V, S> {}
unsafe impl<K: Send, V: Send, S: Sync> Sync for RingBuffer<K, V, S> {}

impl<K, V> RingBuffer<K, V> {
    /// Creates a ring buffer with no user state.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_user_state(config, ())
    }
}

impl<K, V, S> RingBuffer<K, V, S> {
    /// Creates a ring buffer carrying `user_state`, returned unchanged by
    /// [`user_state`](Self::user_state).
    pub fn with_user_state(config: Config, user_state: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let number_elements = config.number_elements;

        // Fixed-size element pool, allocated once.
        let elements: Box<[Element<K, V>]> = (0..number_elements)
            .map(|i| Element {
                queue_node: AtomicU32::new(i as u32),
                payload: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        let freelist = Freelist::new(number_elements);
        let queue = UmmQueue::new(number_elements, RESERVED);
        for index in (RESERVED + 1..number_elements as u32).rev() {
            freelist.push(index);
        }

        tracing::debug!(
            number_elements,
            capacity = config.capacity(),
            metrics = config.enable_metrics,
            "ring buffer initialized"
        );

        Ok(Self {
            elements,
            freelist,
            queue,
            metrics: Metrics::new(),
            config,
            user_state,
        })
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Number of entries held before writes start overwriting.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// The configuration the ring was built with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The state supplied at construction.
    #[inline]
    pub fn user_state(&self) -> &S {
        &self.user_state
    }

    /// Get a snapshot of metrics, or an all-zero snapshot when
    /// `enable_metrics` is off.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // ---------------------------------------------------------------------
    // WRITE / READ
    // ---------------------------------------------------------------------

    /// Writes an entry. Never blocks and never rejects.
    ///
    /// Returns `None` if a free slot was used, or `Some((key, value))` with
    /// the oldest unread entry if the ring was full and that entry was
    /// overwritten. The new entry is always the newest in read order.
    pub fn write(&self, key: K, value: V) -> Option<(K, V)> {
        let mut backoff = Backoff::new();
        loop {
            if let Some(index) = self.freelist.pop() {
                // SAFETY: popped from the freelist, so this thread holds the
                // element and its payload is uninitialized.
                unsafe { self.fill(index, key, value) };
                self.publish(index);
                self.record_write(false);
                return None;
            }

            if let Some(Dequeued { node, element }) = self.queue.dequeue() {
                // SAFETY: dequeued, so this thread holds the element and its
                // payload is initialized. It is refilled before re-enqueueing.
                let overwritten = unsafe {
                    let previous = self.take(element);
                    self.fill(element, key, value);
                    previous
                };
                self.adopt(element, node);
                self.publish(element);
                self.record_write(true);
                return Some(overwritten);
            }

            if self.config.enable_metrics {
                self.metrics.add_write_retry();
            }
            backoff.snooze();
        }
    }

    /// Reads the oldest unread entry, or `None` if there is none.
    pub fn read(&self) -> Option<(K, V)> {
        let Some(Dequeued { node, element }) = self.queue.dequeue() else {
            if self.config.enable_metrics {
                self.metrics.add_read(false);
            }
            return None;
        };

        // SAFETY: dequeued, so this thread holds the element and its payload
        // is initialized. It is released to the freelist emptied.
        let entry = unsafe { self.take(element) };
        self.adopt(element, node);
        self.release(element);

        if self.config.enable_metrics {
            self.metrics.add_read(true);
        }
        Some(entry)
    }

    // ---------------------------------------------------------------------
    // SINGLE-THREADED OPERATIONS
    // ---------------------------------------------------------------------

    /// Introspection that runs outside the lock-free protocol.
    pub fn query(&mut self, query: Query) -> QueryOutput {
        match query {
            Query::GetCount => QueryOutput::Count(self.count()),
            Query::Validate(info) => QueryOutput::Validity(self.validate(info)),
        }
    }

    /// Number of unread entries.
    pub fn count(&mut self) -> usize {
        self.queue.count_quiescent()
    }

    /// Checks that every usable element is linked exactly once across the
    /// freelist and the queue, and that the unread count lies within `info`.
    pub fn validate(&mut self, info: Option<ValidationInfo>) -> Result<(), ValidationError> {
        let result = query::validate(
            self.elements.len(),
            RESERVED,
            &self.freelist,
            &self.queue,
            info,
        );
        if let Err(error) = &result {
            tracing::warn!(%error, "ring buffer validation failed");
        }
        result.map(|_| ())
    }

    /// Tears the ring down, visiting every usable element exactly once.
    ///
    /// Unread entries are passed to `callback` first, oldest first, as
    /// [`Disposition::Unread`]; free slots follow as
    /// [`Disposition::Drained`].
    pub fn cleanup<F>(self, mut callback: F)
    where
        F: FnMut(&S, Disposition<K, V>),
    {
        let mut unread = 0;
        while let Some(Dequeued { element, .. }) = self.queue.dequeue() {
            // SAFETY: `self` is owned; queued payloads are initialized. The
            // element is not relinked, so `Drop` will not see it again.
            let (key, value) = unsafe { self.take(element) };
            callback(&self.user_state, Disposition::Unread { key, value });
            unread += 1;
        }

        let mut drained = 0;
        while self.freelist.pop().is_some() {
            callback(&self.user_state, Disposition::Drained);
            drained += 1;
        }

        debug_assert_conserved!(unread, drained, self.capacity());
        tracing::debug!(unread, drained, "ring buffer cleaned up");
    }

    // ---------------------------------------------------------------------
    // ELEMENT HAND-OFF
    // ---------------------------------------------------------------------

    /// # Safety
    /// The caller holds `index` and its payload is uninitialized.
    #[inline]
    unsafe fn fill(&self, index: u32, key: K, value: V) {
        (*self.elements[index as usize].payload.get()).write((key, value));
    }

    /// # Safety
    /// The caller holds `index` and its payload is initialized. The payload
    /// is uninitialized afterwards.
    #[inline]
    unsafe fn take(&self, index: u32) -> (K, V) {
        (*self.elements[index as usize].payload.get()).assume_init_read()
    }

    /// Records the queue node released by a dequeue as the element's own.
    #[inline]
    fn adopt(&self, index: u32, node: u32) {
        self.elements[index as usize]
            .queue_node
            .store(node, Ordering::Relaxed);
    }

    #[inline]
    fn publish(&self, index: u32) {
        debug_assert_not_reserved!(index, RESERVED);
        let node = self.elements[index as usize].queue_node.load(Ordering::Relaxed);
        self.queue.enqueue(node, index);
    }

    #[inline]
    fn release(&self, index: u32) {
        debug_assert_not_reserved!(index, RESERVED);
        self.freelist.push(index);
    }

    #[inline]
    fn record_write(&self, overwrote: bool) {
        if self.config.enable_metrics {
            self.metrics.add_write(overwrote);
        }
    }
}

impl<K, V, S> Drop for RingBuffer<K, V, S> {
    fn drop(&mut self) {
        // Drop all unread payloads
        while let Some(Dequeued { element, .. }) = self.queue.dequeue() {
            // SAFETY: exclusive access; queued payloads are initialized.
            unsafe { drop(self.take(element)) };
        }
    }
}

impl<K, V, S: std::fmt::Debug> std::fmt::Debug for RingBuffer<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("config", &self.config)
            .field("user_state", &self.user_state)
            .finish_non_exhaustive()
    }
}
