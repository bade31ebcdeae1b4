//! Kernel statistics collection and reporting.
//!
//! This module tracks activity counters for one session. It provides:
//! 1. **Lifecycle:** Events created and destroyed.
//! 2. **Notification traffic:** Immediate and delayed notifications, merged
//!    and superseded delayed requests, cancellations.
//! 3. **Dispatch:** Delta rounds, dispatched callbacks, waiter deliveries,
//!    dynamic-waiter prunes.
//! 4. **Naming:** Collision renames (the advisory condition of event
//!    construction).

use std::fmt::Write as _;

/// Activity counters for one kernel session.
#[derive(Clone, Debug, Default)]
pub struct KernelStats {
    /// Events constructed (internal and hierarchical).
    pub events_created: u64,
    /// Events destroyed.
    pub events_destroyed: u64,

    /// Immediate notifications delivered.
    pub immediate_notifications: u64,
    /// Delayed notifications scheduled (including reschedules to an earlier
    /// deadline).
    pub delayed_notifications: u64,
    /// Delayed requests dropped because an earlier deadline was pending.
    pub delayed_merged: u64,
    /// Pending delayed notifications replaced by an earlier deadline.
    pub delayed_superseded: u64,
    /// Pending delayed notifications cancelled (explicitly or by
    /// destruction or immediate supersession).
    pub cancellations: u64,

    /// Delta rounds dispatched.
    pub delta_rounds: u64,
    /// Delayed-notification callbacks actually invoked.
    pub dispatched_callbacks: u64,
    /// Individual waiter deliveries across all fan-outs.
    pub waiter_notifications: u64,
    /// Dynamic waiters pruned after reporting no further interest.
    pub dynamic_prunes: u64,

    /// Basename collisions resolved by renaming.
    pub naming_collisions: u64,
}

impl KernelStats {
    /// Renders the counters as an aligned report.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "==========================================");
        let _ = writeln!(out, "EVENT KERNEL STATISTICS");
        let _ = writeln!(out, "==========================================");
        let _ = writeln!(out, "events.created           {}", self.events_created);
        let _ = writeln!(out, "events.destroyed         {}", self.events_destroyed);
        let _ = writeln!(
            out,
            "notify.immediate         {}",
            self.immediate_notifications
        );
        let _ = writeln!(
            out,
            "notify.delayed           {}",
            self.delayed_notifications
        );
        let _ = writeln!(out, "notify.merged            {}", self.delayed_merged);
        let _ = writeln!(out, "notify.superseded        {}", self.delayed_superseded);
        let _ = writeln!(out, "notify.cancelled         {}", self.cancellations);
        let _ = writeln!(out, "dispatch.rounds          {}", self.delta_rounds);
        let _ = writeln!(
            out,
            "dispatch.callbacks       {}",
            self.dispatched_callbacks
        );
        let _ = writeln!(
            out,
            "dispatch.waiters         {}",
            self.waiter_notifications
        );
        let _ = writeln!(out, "dispatch.pruned          {}", self.dynamic_prunes);
        let _ = writeln!(out, "naming.collisions        {}", self.naming_collisions);
        out
    }
}
