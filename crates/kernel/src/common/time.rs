//! Simulated time.
//!
//! This module defines the tick type the kernel orders all activity by.
//! It provides:
//! 1. **Type Safety:** Simulated instants and delays are never confused with
//!    raw counters or wall-clock values.
//! 2. **Ordering:** Total order over instants, used by the notification queue.
//! 3. **Arithmetic:** Saturating addition for computing absolute deadlines
//!    from relative delays.
//!
//! How a tick maps to wall-clock time is a concern of the embedding
//! framework, never of this kernel.

use std::fmt;

/// An instant (or relative delay) in simulated time, measured in ticks.
///
/// The same type serves both absolute instants and relative delays; which one
/// a value means is determined by the operation it is passed to, exactly as
/// with the queue's deadline arithmetic in [`SimTime::plus`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime(pub u64);

impl SimTime {
    /// The zero instant, where every simulation session begins.
    pub const ZERO: Self = Self(0);

    /// Creates a simulated time from a raw tick count.
    #[inline(always)]
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Returns this instant advanced by `delay`, saturating at the far end
    /// of simulated time rather than wrapping.
    #[inline]
    pub const fn plus(self, delay: Self) -> Self {
        Self(self.0.saturating_add(delay.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}t", self.0)
    }
}
