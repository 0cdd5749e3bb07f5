//! Debug assertion macros for pipe invariants.
//!
//! These provide runtime checks for the invariants documented in
//! `SPEC_FULL.md` §3 (I1–I5) and §8 (P1–P6). They are only active in debug
//! builds (`#[cfg(debug_assertions)]`), so there is zero overhead in release
//! builds. Mirrors the donor crate's `invariants.rs` tagging convention.

// =============================================================================
// I1: Bounded occupancy
// =============================================================================

/// Assert that buffer occupancy never exceeds a bounded pipe's capacity.
///
/// **Invariant**: `0 ≤ len ≤ capacity` when `capacity > 0`.
macro_rules! debug_assert_within_capacity {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $capacity == 0 || $len <= $capacity,
            "I1 violated: occupancy {} exceeds capacity {}",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// P4: End-of-stream stickiness
// =============================================================================

/// Assert that a pipe already observed as drained-and-closed never reports
/// a nonzero producer count again (producers only ever decrease to zero).
macro_rules! debug_assert_eos_sticky {
    ($producers:expr) => {
        debug_assert_eq!($producers, 0, "P4 violated: producer count resurrected after reaching zero")
    };
}

// =============================================================================
// Ticket sequencer ordering
// =============================================================================

/// Assert a ticket sequencer's "turn" counter only ever advances, never
/// skips or rewinds relative to the ticket that was just served.
macro_rules! debug_assert_ticket_progress {
    ($turn_before:expr, $turn_after:expr) => {
        debug_assert_eq!(
            $turn_after,
            $turn_before + 1,
            "ticket sequencer violated: turn advanced from {} to {} (expected +1)",
            $turn_before,
            $turn_after
        )
    };
}

pub(crate) use debug_assert_eos_sticky;
pub(crate) use debug_assert_ticket_progress;
pub(crate) use debug_assert_within_capacity;
