//! Atomic primitives used by the lock-free protocol.
//!
//! With `--features loom` these resolve to loom's instrumented atomics so the
//! model tests exercise the real freelist, queue and ring buffer code.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
