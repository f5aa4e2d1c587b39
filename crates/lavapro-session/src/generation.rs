//! Request generations.
//!
//! Each fetch takes a [`Ticket`]; starting a newer fetch (or clearing the
//! state) makes older tickets stale, and a stale result is dropped instead
//! of overwriting newer state.
//!
//! ```text
//!   fetch A ── ticket 1 ──────────────────────────────► result A (stale, dropped)
//!   fetch B ──────── ticket 2 ─────► result B (applied)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Counter shared by all fetches of one resolver.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn new() -> Self {
        Generation(AtomicU64::new(0))
    }

    /// Starts a new generation; every earlier ticket becomes stale.
    pub fn next(&self) -> Ticket {
        Ticket(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` belongs to the newest generation.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0.load(Ordering::Acquire) == ticket.0
    }
}
