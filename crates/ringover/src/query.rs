//! Single-threaded introspection: unread count and structural validation.
//!
//! Both walks run outside the lock-free protocol, which is why
//! [`RingBuffer::query`](crate::RingBuffer::query) takes `&mut self`.

use crate::error::{Structure, ValidationError};
use crate::freelist::Freelist;
use crate::link::NIL;
use crate::queue::UmmQueue;

/// What to ask a quiescent ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Number of unread entries.
    GetCount,
    /// Check internal consistency, optionally bounding the unread count.
    Validate(Option<ValidationInfo>),
}

/// Answer to a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutput {
    Count(usize),
    Validity(Result<(), ValidationError>),
}

impl QueryOutput {
    /// The count, if this answers [`Query::GetCount`].
    pub fn count(self) -> Option<usize> {
        match self {
            Self::Count(n) => Some(n),
            Self::Validity(_) => None,
        }
    }

    /// The validation result, if this answers [`Query::Validate`].
    pub fn validity(self) -> Option<Result<(), ValidationError>> {
        match self {
            Self::Validity(r) => Some(r),
            Self::Count(_) => None,
        }
    }
}

/// Expected bounds on the unread count, checked by [`Query::Validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationInfo {
    pub min_elements: usize,
    pub max_elements: usize,
}

impl ValidationInfo {
    pub const fn new(min_elements: usize, max_elements: usize) -> Self {
        Self {
            min_elements,
            max_elements,
        }
    }

    /// Expect exactly `count` unread entries.
    pub const fn exactly(count: usize) -> Self {
        Self::new(count, count)
    }
}

/// Per-element bookkeeping for one validation pass.
struct Census {
    seen: Vec<bool>,
    reserved: u32,
    found: usize,
}

impl Census {
    fn new(element_count: usize, reserved: u32) -> Self {
        Self {
            seen: vec![false; element_count],
            reserved,
            found: 0,
        }
    }

    fn record(&mut self, index: u32, structure: Structure) -> Result<(), ValidationError> {
        if index as usize >= self.seen.len() {
            return Err(ValidationError::LinkOutOfBounds { structure, index });
        }
        if index == self.reserved {
            return Err(ValidationError::ReservedElementLinked { structure });
        }
        if std::mem::replace(&mut self.seen[index as usize], true) {
            return Err(ValidationError::DuplicateElement { structure, index });
        }
        self.found += 1;
        Ok(())
    }
}

/// Walks queue then freelist and checks that every usable element is linked
/// exactly once. Returns the unread count on success.
pub(crate) fn validate(
    element_count: usize,
    reserved: u32,
    freelist: &Freelist,
    queue: &UmmQueue,
    info: Option<ValidationInfo>,
) -> Result<usize, ValidationError> {
    let mut census = Census::new(element_count, reserved);
    let unread = walk_queue(queue, &mut census)?;
    walk_freelist(freelist, &mut census)?;

    // Census rejects duplicates and the reserved element, so only a
    // shortfall is possible here.
    let expected = element_count - 1;
    if census.found < expected {
        return Err(ValidationError::MissingElements {
            expected,
            found: census.found,
        });
    }

    if let Some(ValidationInfo {
        min_elements,
        max_elements,
    }) = info
    {
        if unread < min_elements || unread > max_elements {
            return Err(ValidationError::CountOutOfRange {
                count: unread,
                min: min_elements,
                max: max_elements,
            });
        }
    }

    Ok(unread)
}

fn walk_queue(queue: &UmmQueue, census: &mut Census) -> Result<usize, ValidationError> {
    let structure = Structure::Queue;
    let node_count = queue.node_count();
    let tail = queue.tail_index();
    let mut visited = vec![false; node_count];
    let mut tail_seen = false;
    let mut unread = 0;

    let mut node = queue.head_index();
    if node as usize >= node_count {
        return Err(ValidationError::LinkOutOfBounds { structure, index: node });
    }
    visited[node as usize] = true;
    tail_seen |= node == tail;

    // The head node is the dummy; each node after it carries one element.
    loop {
        let next = queue.next_of(node);
        if next == NIL {
            break;
        }
        if next as usize >= node_count {
            return Err(ValidationError::LinkOutOfBounds { structure, index: next });
        }
        if std::mem::replace(&mut visited[next as usize], true) {
            return Err(ValidationError::Loop { structure });
        }
        census.record(queue.element_of(next), structure)?;
        tail_seen |= next == tail;
        unread += 1;
        node = next;
    }

    if !tail_seen {
        return Err(ValidationError::TailUnreachable { tail });
    }
    Ok(unread)
}

fn walk_freelist(freelist: &Freelist, census: &mut Census) -> Result<(), ValidationError> {
    let structure = Structure::Freelist;
    let capacity = freelist.capacity();
    let mut visited = vec![false; capacity];

    let mut index = freelist.head_index();
    while index != NIL {
        if index as usize >= capacity {
            return Err(ValidationError::LinkOutOfBounds { structure, index });
        }
        if visited[index as usize] {
            return Err(ValidationError::Loop { structure });
        }
        visited[index as usize] = true;
        census.record(index, structure)?;
        index = freelist.next_of(index);
    }
    Ok(())
}
