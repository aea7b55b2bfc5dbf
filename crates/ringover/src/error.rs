//! Error types for ring buffer construction and validation.

use std::fmt;
use thiserror::Error;

/// Errors returned when constructing a ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Fewer than two elements: one is the queue's dummy, leaving no slot.
    #[error("ring needs at least 2 elements (one is the queue dummy), got {requested}")]
    TooFewElements {
        /// The requested element count.
        requested: usize,
    },
    /// More elements than the 32-bit index space can address.
    #[error("ring supports at most {max} elements, got {requested}")]
    TooManyElements {
        /// The requested element count.
        requested: usize,
        /// The largest supported element count.
        max: usize,
    },
}

/// Which internal structure a validation failure was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    Freelist,
    Queue,
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Freelist => f.write_str("freelist"),
            Self::Queue => f.write_str("queue"),
        }
    }
}

/// Inconsistencies reported by [`Query::Validate`](crate::Query::Validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Following links revisited a node.
    #[error("loop detected in {structure}")]
    Loop { structure: Structure },

    /// A link points outside its arena.
    #[error("{structure} link to index {index} is out of bounds")]
    LinkOutOfBounds { structure: Structure, index: u32 },

    /// The same element is reachable twice.
    #[error("element {index} is linked more than once (second time in {structure})")]
    DuplicateElement { structure: Structure, index: u32 },

    /// The element reserved for the queue dummy carries a payload.
    #[error("reserved element is linked into the {structure}")]
    ReservedElementLinked { structure: Structure },

    /// Fewer elements reachable than the ring owns.
    #[error("{found} elements reachable, expected {expected}")]
    MissingElements { expected: usize, found: usize },

    /// The queue tail is not on the chain starting at the head.
    #[error("queue tail node {tail} is not reachable from the head")]
    TailUnreachable { tail: u32 },

    /// The unread count lies outside the caller's expected range.
    #[error("{count} unread elements, expected between {min} and {max}")]
    CountOutOfRange { count: usize, min: usize, max: usize },
}
