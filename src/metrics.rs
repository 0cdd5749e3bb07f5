use std::sync::atomic::{AtomicU64, Ordering};

/// Internal, always-`Sync` counters for a single pipe.
///
/// Mirrors the donor crate's `Metrics` (messages/batches sent & received)
/// but adds block counters, since this pipe's defining characteristic
/// (unlike the donor's lock-free ring) is that `push`/`pop` can actually
/// block, and "how often did we have to wait" is the interesting number for
/// a blocking queue.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    enabled: bool,
    elements_pushed: AtomicU64,
    elements_popped: AtomicU64,
    push_batches: AtomicU64,
    pop_batches: AtomicU64,
    push_waits: AtomicU64,
    pop_waits: AtomicU64,
    orphaned_pushes: AtomicU64,
}

impl Metrics {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    #[inline]
    pub(crate) fn record_push(&self, n: usize) {
        if !self.enabled || n == 0 {
            return;
        }
        self.elements_pushed.fetch_add(n as u64, Ordering::Relaxed);
        self.push_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_pop(&self, n: usize) {
        if !self.enabled || n == 0 {
            return;
        }
        self.elements_popped.fetch_add(n as u64, Ordering::Relaxed);
        self.pop_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_push_wait(&self) {
        if self.enabled {
            self.push_waits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_pop_wait(&self) {
        if self.enabled {
            self.pop_waits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_orphaned_push(&self) {
        if self.enabled {
            self.orphaned_pushes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elements_pushed: self.elements_pushed.load(Ordering::Relaxed),
            elements_popped: self.elements_popped.load(Ordering::Relaxed),
            push_batches: self.push_batches.load(Ordering::Relaxed),
            pop_batches: self.pop_batches.load(Ordering::Relaxed),
            push_waits: self.push_waits.load(Ordering::Relaxed),
            pop_waits: self.pop_waits.load(Ordering::Relaxed),
            orphaned_pushes: self.orphaned_pushes.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time, `Copy`-able read-out of a pipe's metrics counters.
///
/// Only populated when [`crate::Config::enable_metrics`] is set; otherwise
/// every field stays zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total elements successfully enqueued.
    pub elements_pushed: u64,
    /// Total elements successfully dequeued.
    pub elements_popped: u64,
    /// Number of `push` calls that enqueued at least one element.
    pub push_batches: u64,
    /// Number of `pop` calls that dequeued at least one element.
    pub pop_batches: u64,
    /// Number of times a `push` call had to wait for buffer space.
    pub push_waits: u64,
    /// Number of times a `pop` call had to wait for data.
    pub pop_waits: u64,
    /// Number of `push` calls that discarded elements because every
    /// consumer had already departed.
    pub orphaned_pushes: u64,
}
