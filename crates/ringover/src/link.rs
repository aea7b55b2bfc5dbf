use crate::sync::{AtomicU64, Ordering};

/// Index value meaning "no node".
pub(crate) const NIL: u32 = u32::MAX;

// =============================================================================
// TAGGED LINKS (ABA Prevention)
// =============================================================================
//
// Every shared link (freelist head, queue head, queue tail, queue `next`) is a
// single 64-bit word holding a 32-bit arena index and a 32-bit tag. Each
// successful CAS installs a link with the tag incremented, so a thread holding
// a stale snapshot fails its CAS even when the same index has come back.
//
// Nodes live in arenas that are never freed, so following a stale index is
// always a valid memory access; the tag is what rejects acting on it.
//
// A false CAS success needs a thread to stall across exactly 2^32 updates of
// the same word.
// =============================================================================

/// An arena index paired with a modification tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
    index: u32,
    tag: u32,
}

impl Link {
    #[inline]
    pub(crate) const fn new(index: u32, tag: u32) -> Self {
        Self { index, tag }
    }

    #[inline]
    pub(crate) const fn nil(tag: u32) -> Self {
        Self::new(NIL, tag)
    }

    #[inline]
    pub(crate) const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub(crate) const fn tag(self) -> u32 {
        self.tag
    }

    #[inline]
    pub(crate) const fn is_nil(self) -> bool {
        self.index == NIL
    }

    /// The link to install when replacing `self` with `index` via CAS.
    #[inline]
    pub(crate) const fn retag(self, index: u32) -> Self {
        Self::new(index, self.tag.wrapping_add(1))
    }

    #[inline]
    const fn pack(self) -> u64 {
        ((self.tag as u64) << 32) | self.index as u64
    }

    #[inline]
    const fn unpack(word: u64) -> Self {
        Self::new(word as u32, (word >> 32) as u32)
    }
}

/// A [`Link`] stored in one atomic word.
pub(crate) struct AtomicLink {
    word: AtomicU64,
}

impl AtomicLink {
    pub(crate) fn new(link: Link) -> Self {
        Self {
            word: AtomicU64::new(link.pack()),
        }
    }

    #[inline]
    pub(crate) fn load(&self, order: Ordering) -> Link {
        Link::unpack(self.word.load(order))
    }

    #[inline]
    pub(crate) fn store(&self, link: Link, order: Ordering) {
        self.word.store(link.pack(), order);
    }

    #[inline]
    pub(crate) fn compare_exchange(
        &self,
        current: Link,
        new: Link,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Link, Link> {
        self.word
            .compare_exchange(current.pack(), new.pack(), success, failure)
            .map(Link::unpack)
            .map_err(Link::unpack)
    }

    #[inline]
    pub(crate) fn compare_exchange_weak(
        &self,
        current: Link,
        new: Link,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Link, Link> {
        self.word
            .compare_exchange_weak(current.pack(), new.pack(), success, failure)
            .map(Link::unpack)
            .map_err(Link::unpack)
    }
}
