use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::config::Config;
use crate::invariants::{debug_assert_eos_sticky, debug_assert_ticket_progress, debug_assert_within_capacity};
use crate::metrics::{Metrics, MetricsSnapshot};

/// Shared state protected by `Inner::mutex`.
///
/// Every field that end-of-stream detection depends on (`buffer`,
/// `producers`, `consumers`) lives here so that a single lock acquisition
/// sees a consistent view, per `spec.md` §4.1 ("One mutex protects head,
/// tail, count, live-producer count, live-consumer count, and the buffer").
struct State<T> {
    buffer: VecDeque<T>,
    producers: usize,
    consumers: usize,
    /// Next ticket handed to an arriving `push` call.
    next_push_ticket: u64,
    /// Ticket currently allowed to write (see `Pipe::push`).
    push_turn: u64,
    /// Next ticket handed to an arriving `pop` call.
    next_pop_ticket: u64,
    /// Ticket currently allowed to read (see `Pipe::pop`).
    pop_turn: u64,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    /// Signalled whenever the buffer gains data, a producer departs, or a
    /// push ticket's turn advances.
    not_empty: Condvar,
    /// Signalled whenever the buffer gains space, a consumer departs, or a
    /// pop ticket's turn advances.
    not_full: Condvar,
    capacity: usize,
    default_batch: usize,
    metrics: Metrics,
}

/// The owner handle returned by [`Pipe::new`].
///
/// Mints [`Producer`] and [`Consumer`] handles. It cannot itself push or
/// pop. Cloning a `Pipe` just clones the underlying `Arc` — there is no
/// separate owner refcount to manage (see `SPEC_FULL.md` §3).
pub struct Pipe<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Pipe<T> {
    /// Creates a new pipe with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    buffer: VecDeque::new(),
                    producers: 0,
                    consumers: 0,
                    next_push_ticket: 0,
                    push_turn: 0,
                    next_pop_ticket: 0,
                    pop_turn: 0,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity: config.capacity,
                default_batch: config.default_batch,
                metrics: Metrics::new(config.enable_metrics),
            }),
        }
    }

    /// Mints a new producer handle, incrementing the live-producer count.
    #[must_use]
    pub fn producer(&self) -> Producer<T> {
        let mut state = self.inner.state.lock().unwrap();
        state.producers += 1;
        drop(state);
        Producer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Mints a new consumer handle, incrementing the live-consumer count.
    #[must_use]
    pub fn consumer(&self) -> Consumer<T> {
        let mut state = self.inner.state.lock().unwrap();
        state.consumers += 1;
        drop(state);
        Consumer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// A snapshot of this pipe's metrics counters (all zero unless
    /// `Config::enable_metrics` was set).
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// The size in bytes of one element, matching `spec.md` §6's
    /// `element_size(handle)`. A compile-time constant in this typed design.
    #[must_use]
    pub const fn element_size() -> usize {
        std::mem::size_of::<T>()
    }

    /// The configured capacity (`0` means unbounded).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl<T> Clone for Pipe<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Producer handle: may [`Producer::push`]. Counted in the live-producer
/// count; dropping it decrements that count and wakes any consumer blocked
/// on empty-buffer (`spec.md` §3 "release ... producer count → 0 wakes
/// blocked consumers").
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
}

/// Consumer handle: may [`Consumer::pop`]. Counted in the live-consumer
/// count; dropping it decrements that count and wakes any producer blocked
/// on full-buffer (`spec.md` §3 "consumer count → 0 wakes blocked producers
/// so they can fail-fast").
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Producer<T> {
    /// Mints another producer handle sharing this pipe.
    #[must_use]
    pub fn producer(&self) -> Producer<T> {
        let mut state = self.inner.state.lock().unwrap();
        state.producers += 1;
        drop(state);
        Producer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Mints a consumer handle sharing this pipe.
    #[must_use]
    pub fn consumer(&self) -> Consumer<T> {
        let mut state = self.inner.state.lock().unwrap();
        state.consumers += 1;
        drop(state);
        Consumer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Bulk-enqueues `items` in order.
    ///
    /// Blocks while the pipe is bounded and full, as long as at least one
    /// consumer remains live. If every consumer has departed mid-call, the
    /// undelivered remainder is silently discarded and the call returns
    /// without blocking further (`spec.md` §4.1, §7.3). Returns the number
    /// of elements actually enqueued.
    ///
    /// Concurrent `push` calls on producers of the same pipe are serialised
    /// so that one call's elements always appear as a contiguous run in the
    /// consumer order, even if the call needs multiple wake-ups to finish
    /// (`spec.md` §5, "no interleaving within a single push batch"); see
    /// `SPEC_FULL.md` §4.1 for why this needs more than the bare mutex.
    pub fn push(&self, items: Vec<T>) -> usize {
        let mut items: VecDeque<T> = items.into();
        let total = items.len();
        if total == 0 {
            return 0;
        }

        let inner = &*self.inner;
        let mut state = inner.state.lock().unwrap();

        let ticket = state.next_push_ticket;
        state.next_push_ticket += 1;
        while state.push_turn != ticket {
            state = inner.not_empty.wait(state).unwrap();
            // not_empty also carries push-turn wakeups; see pop()'s
            // pop_turn advance, which notifies not_full, and push_turn
            // advance below, which notifies not_empty.
        }

        loop {
            if items.is_empty() {
                break;
            }
            if state.consumers == 0 {
                inner.metrics.record_orphaned_push();
                items.clear();
                break;
            }
            if inner.capacity == 0 {
                state.buffer.extend(items.drain(..));
                inner.not_empty.notify_all();
                break;
            }
            let space = inner.capacity.saturating_sub(state.buffer.len());
            if space == 0 {
                inner.metrics.record_push_wait();
                state = inner.not_full.wait(state).unwrap();
                continue;
            }
            let take = space.min(items.len());
            state.buffer.extend(items.drain(..take));
            debug_assert_within_capacity!(state.buffer.len(), inner.capacity);
            // Wake any consumer parked on an empty buffer before possibly
            // parking ourselves on not_full below — otherwise a consumer
            // asleep on not_empty and a producer asleep on not_full can wait
            // on each other forever.
            inner.not_empty.notify_all();
        }

        let sent = total - items.len();
        let turn_before = state.push_turn;
        state.push_turn += 1;
        debug_assert_ticket_progress!(turn_before, state.push_turn);
        drop(state);

        inner.not_empty.notify_all();
        inner.metrics.record_push(sent);
        sent
    }
}

impl<T> Consumer<T> {
    /// Mints another consumer handle sharing this pipe.
    #[must_use]
    pub fn consumer(&self) -> Consumer<T> {
        let mut state = self.inner.state.lock().unwrap();
        state.consumers += 1;
        drop(state);
        Consumer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Mints a producer handle sharing this pipe.
    #[must_use]
    pub fn producer(&self) -> Producer<T> {
        let mut state = self.inner.state.lock().unwrap();
        state.producers += 1;
        drop(state);
        Producer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Bulk-dequeues up to `max` elements in FIFO order.
    ///
    /// Blocks while the buffer is empty as long as at least one producer
    /// remains live. Returns an empty `Vec` the moment every producer has
    /// departed and the buffer is drained — that condition is permanent
    /// (`spec.md` §8 P4) since no producer handle can ever push again.
    /// `max == 0` trivially returns an empty `Vec` without blocking or
    /// consuming a pop ticket.
    ///
    /// Concurrent `pop` calls are serialised the same way `push` calls are,
    /// so one call's elements are always a contiguous run of the producer
    /// order (`spec.md` §5).
    #[must_use]
    pub fn pop(&self, max: usize) -> Vec<T> {
        if max == 0 {
            return Vec::new();
        }

        let inner = &*self.inner;
        let mut state = inner.state.lock().unwrap();

        let ticket = state.next_pop_ticket;
        state.next_pop_ticket += 1;
        while state.pop_turn != ticket {
            state = inner.not_full.wait(state).unwrap();
        }

        loop {
            if !state.buffer.is_empty() {
                break;
            }
            if state.producers == 0 {
                debug_assert_eos_sticky!(state.producers);
                break;
            }
            inner.metrics.record_pop_wait();
            state = inner.not_empty.wait(state).unwrap();
        }

        let take = max.min(state.buffer.len());
        let out: Vec<T> = state.buffer.drain(..take).collect();

        let turn_before = state.pop_turn;
        state.pop_turn += 1;
        debug_assert_ticket_progress!(turn_before, state.pop_turn);
        drop(state);

        // Always notify: this wakes both a producer blocked on buffer space
        // (only relevant if `take > 0`) and the next pop ticket's turn-wait
        // loop (relevant even when `take == 0`, i.e. end-of-stream).
        inner.not_full.notify_all();
        inner.metrics.record_pop(take);
        out
    }

    /// The configured worker batch size for stages reading from this pipe.
    #[must_use]
    pub fn default_batch(&self) -> usize {
        self.inner.default_batch
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock().unwrap();
        state.producers -= 1;
        let exhausted = state.producers == 0;
        drop(state);
        if exhausted {
            self.inner.not_empty.notify_all();
        }
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock().unwrap();
        state.consumers -= 1;
        let exhausted = state.consumers == 0;
        drop(state);
        if exhausted {
            self.inner.not_full.notify_all();
        }
    }
}
