//! Lock-free running-query counter.

use std::sync::atomic::{AtomicU32, Ordering};

/// Number of queries currently running against an entity.
///
/// Every increment must be matched by exactly one decrement. The counter
/// itself does not guard against underflow: a stray decrement wraps.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU32,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of running queries.
    pub fn read(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }

    /// Add one running query and return the new count.
    pub fn increment(&self) -> u32 {
        self.value.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Remove one running query.
    pub fn decrement(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }
}
