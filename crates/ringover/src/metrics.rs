use std::sync::atomic::{AtomicU64, Ordering};

/// Optional counters for monitoring ring buffer traffic.
///
/// Updated with relaxed atomics; a snapshot taken while writers are active
/// is approximate.
#[derive(Debug)]
pub struct Metrics {
    writes: AtomicU64,
    overwrites: AtomicU64,
    reads: AtomicU64,
    empty_reads: AtomicU64,
    write_retries: AtomicU64,
}

/// A point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Completed writes, including overwrites.
    pub writes: u64,
    /// Writes that displaced the oldest unread entry.
    pub overwrites: u64,
    /// Reads that returned an entry.
    pub reads: u64,
    /// Reads that found the ring empty.
    pub empty_reads: u64,
    /// Times a writer found both the freelist and the queue empty and retried.
    pub write_retries: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            writes: AtomicU64::new(0),
            overwrites: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            empty_reads: AtomicU64::new(0),
            write_retries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn add_write(&self, overwrote: bool) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.overwrites.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn add_read(&self, found: bool) {
        if found {
            self.reads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.empty_reads.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn add_write_retry(&self) {
        self.write_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            overwrites: self.overwrites.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            write_retries: self.write_retries.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let m = Metrics::new();
        m.add_write(false);
        m.add_write(true);
        m.add_read(true);
        m.add_read(false);
        m.add_read(false);
        m.add_write_retry();

        assert_eq!(
            m.snapshot(),
            MetricsSnapshot {
                writes: 2,
                overwrites: 1,
                reads: 1,
                empty_reads: 2,
                write_retries: 1,
            }
        );
    }
}
