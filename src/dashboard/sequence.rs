/// Per-slot request sequencing.
///
/// Every write to a slot carries a [`Ticket`] drawn when the operation
/// started. Tickets are numbered per slot, starting at 1. A write is applied
/// only if its ticket is at least as new as the newest ticket already applied
/// to that slot, so a slow response can never overwrite the result of a
/// request issued after it. A request's own loading indicator and its final
/// response share one ticket.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::render::Slot;

const SLOT_COUNT: usize = Slot::ALL.len();

/// Permission to write one slot, ordered by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: Slot,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct SlotSequencer {
    issued: [AtomicU64; SLOT_COUNT],
    applied: [Mutex<u64>; SLOT_COUNT],
}

impl SlotSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next ticket for `slot`.
    pub fn issue(&self, slot: Slot) -> Ticket {
        let seq = self.issued[slot.index()].fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { slot, seq }
    }

    /// Run `apply` if `ticket` is not stale, recording it as the newest
    /// applied ticket. Returns `None` when the ticket was superseded.
    ///
    /// The slot stays locked while `apply` runs, so two writes to the same
    /// slot can never interleave. Lock order when nesting is
    /// `ModelDetails` before `ClassificationResult`.
    pub fn apply<R>(&self, ticket: Ticket, apply: impl FnOnce() -> R) -> Option<R> {
        let mut newest = self.applied[ticket.slot.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if ticket.seq < *newest {
            return None;
        }
        *newest = ticket.seq;
        Some(apply())
    }

    /// Newest ticket number applied to `slot`, `0` if none.
    pub fn applied(&self, slot: Slot) -> u64 {
        *self.applied[slot.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
