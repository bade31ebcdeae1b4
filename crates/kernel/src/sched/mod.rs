//! Scheduler state.
//!
//! The dispatch engine behind delayed notifications. This module holds:
//! 1. **The Queue:** Time-ordered delayed-notification entries, FIFO among
//!    equal times.
//! 2. **The Clock:** Current simulated time, advanced only by the presence
//!    of queued notifications.
//! 3. **Round Bookkeeping:** The change stamp (one increment per delta
//!    round) and the update-phase flag that outlaws immediate notification
//!    while a round is fanning out.
//!
//! The dispatch loop itself lives on the kernel facade, which owns this
//! state next to the event arena it must resolve handles against.

pub(crate) mod queue;

use crate::common::time::SimTime;
use queue::NotifyQueue;

/// Dispatch-engine state for one session.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    /// Pending delayed notifications, ordered by `(time, scheduling order)`.
    pub(crate) queue: NotifyQueue,
    /// Current simulated time.
    pub(crate) now: SimTime,
    /// Incremented once per delta round; answers "did this event fire in
    /// the round that is logically now" in O(1).
    pub(crate) change_stamp: u64,
    /// True exactly while a round's notifications are fanning out.
    pub(crate) in_update: bool,
    /// Rounds dispatched at the current instant, for the runaway-loop
    /// diagnostic.
    pub(crate) rounds_at_now: u64,
}

impl Scheduler {
    /// Moves the clock to `t` when it lies ahead, resetting the
    /// same-instant round counter.
    pub(crate) fn advance_to(&mut self, t: SimTime) {
        if t > self.now {
            self.now = t;
            self.rounds_at_now = 0;
        }
    }
}
