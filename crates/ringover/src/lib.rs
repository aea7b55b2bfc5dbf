//! ringover-rs - Lock-Free Overwrite-On-Full Ring Buffer
//!
//! A fixed-capacity multi-producer multi-consumer ring buffer built by
//! composing two lock-free primitives over one element pool:
//!
//! - a [`Freelist`] (Treiber stack) of empty elements,
//! - a [`UmmQueue`] (Michael-Scott queue) of written elements in FIFO order.
//!
//! `write` never blocks and never fails: when the ring is full it takes the
//! oldest unread entry off the queue, hands it back to the caller and reuses
//! the element for the new entry.
//!
//! # Key Features
//!
//! - Fixed element pool allocated once, never grows
//! - Tagged 32-bit arena indices for ABA-safe CAS loops
//! - Generic key/value payloads, moved in and out (never cloned)
//! - Single-threaded count and validation through `&mut self`
//! - Cleanup callback reporting each element as unread or drained
//!
//! # Example
//!
//! ```
//! use ringover_rs::{Config, RingBuffer};
//!
//! // 4 elements, one reserved for the queue dummy: 3 usable slots
//! let ring = RingBuffer::<u32, &str>::new(Config::new(4, false)).unwrap();
//!
//! assert!(ring.write(1, "one").is_none());
//! assert!(ring.write(2, "two").is_none());
//! assert!(ring.write(3, "three").is_none());
//!
//! // Full: the oldest entry is overwritten and handed back
//! assert_eq!(ring.write(4, "four"), Some((1, "one")));
//!
//! assert_eq!(ring.read(), Some((2, "two")));
//! assert_eq!(ring.read(), Some((3, "three")));
//! assert_eq!(ring.read(), Some((4, "four")));
//! assert_eq!(ring.read(), None);
//! ```

mod backoff;
mod config;
mod error;
mod freelist;
mod invariants;
mod link;
mod metrics;
mod query;
mod queue;
mod ring;
mod sync;

pub use backoff::Backoff;
pub use config::{Config, LARGE_CONFIG, MAX_ELEMENTS, SMALL_CONFIG};
pub use error::{ConfigError, Structure, ValidationError};
pub use freelist::Freelist;
pub use metrics::{Metrics, MetricsSnapshot};
pub use query::{Query, QueryOutput, ValidationInfo};
pub use queue::{Dequeued, UmmQueue};
pub use ring::{Disposition, RingBuffer};
