//! Time-ordered notification queue.
//!
//! A min-heap of delayed-notification entries keyed by `(when, seq)`. The
//! sequence number is a session-wide monotonic counter, so entries scheduled
//! for the identical instant pop in the order they were scheduled: stable
//! FIFO at equal times, which the delivery contract requires exactly.
//!
//! The queue never removes entries from the middle. Cancellation and
//! supersession are lazy: the owning event's pending handle records the live
//! sequence number, and the dispatch loop skips popped entries whose
//! sequence no longer matches.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::common::time::SimTime;
use crate::event::EventId;

/// One scheduled delayed notification.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Entry {
    /// Absolute fire time.
    pub(crate) when: SimTime,
    /// Scheduling order, unique per session.
    pub(crate) seq: u64,
    /// The event to fire.
    pub(crate) event: EventId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.when
            .cmp(&other.when)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of pending delayed notifications.
#[derive(Debug, Default)]
pub(crate) struct NotifyQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl NotifyQueue {
    /// Schedules `event` to fire at `when`; returns the entry's sequence
    /// number for the owner's pending handle.
    pub(crate) fn schedule(&mut self, when: SimTime, event: EventId) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { when, seq, event }));
        seq
    }

    /// The earliest queued entry, stale or not.
    pub(crate) fn peek(&self) -> Option<&Entry> {
        self.heap.peek().map(|Reverse(entry)| entry)
    }

    /// Pops the earliest queued entry.
    pub(crate) fn pop(&mut self) -> Option<Entry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    /// Number of queued entries, including stale ones.
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
