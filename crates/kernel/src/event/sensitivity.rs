//! Waiters and sensitivity lists.
//!
//! When an event fires, the kernel fans the notification out to the waiters
//! registered on it. This module provides:
//! 1. **Waiter Abstraction:** One polymorphic [`Waiter`] trait covering both
//!    method-style callbacks and thread-style wakeups; closures implement it
//!    directly.
//! 2. **Persistence:** Static waiters stay registered forever; dynamic
//!    waiters answer whether they remain interested and are pruned the
//!    moment they are done.
//! 3. **Ordering:** Four lists per event (static/dynamic crossed with
//!    method/thread), always delivered in the same fixed order so delivery
//!    is deterministic.

use crate::event::EventId;
use crate::kernel::Kernel;
use std::fmt;

/// A dynamic waiter's answer to "do you remain interested?".
///
/// Static waiters also return this, but their answer is ignored: static
/// entries are never removed by notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interest {
    /// Stay registered for future notifications.
    Keep,
    /// Prune this entry; the waiter is satisfied.
    Done,
}

/// Which of the two delivery flavors a waiter registers under.
///
/// Method waiters model callback-style processes and are delivered first;
/// thread waiters model suspended-thread wakeups and are delivered second.
/// The kernel does not interpret the flavor beyond its position in the
/// delivery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenseKind {
    /// Callback-style waiter, delivered before thread waiters.
    Method,
    /// Thread-wakeup-style waiter, delivered after method waiters.
    Thread,
}

/// Something notified when an event fires.
///
/// Waiters run on the dispatch thread only, with mutable access to the
/// kernel: scheduling delayed notifications, querying `triggered`, and
/// registering waiters on other events are all legal from inside a
/// notification. Immediate notification is not; the kernel rejects it while
/// its update phase is in progress.
pub trait Waiter {
    /// Called with the firing event. The return value is the waiter's
    /// continued-interest answer, consulted only for dynamic registrations.
    fn on_event(&mut self, kernel: &mut Kernel, event: EventId) -> Interest;
}

impl<F> Waiter for F
where
    F: FnMut(&mut Kernel, EventId) -> Interest,
{
    fn on_event(&mut self, kernel: &mut Kernel, event: EventId) -> Interest {
        self(kernel, event)
    }
}

/// The four waiter lists of one event.
///
/// Delivery order is fixed: static-method, dynamic-method, static-thread,
/// dynamic-thread.
#[derive(Default)]
pub(crate) struct SensitivityLists {
    pub(crate) static_method: Vec<Box<dyn Waiter>>,
    pub(crate) dynamic_method: Vec<Box<dyn Waiter>>,
    pub(crate) static_thread: Vec<Box<dyn Waiter>>,
    pub(crate) dynamic_thread: Vec<Box<dyn Waiter>>,
}

impl SensitivityLists {
    /// Total registered waiters across the four lists.
    pub(crate) fn len(&self) -> usize {
        self.static_method.len()
            + self.dynamic_method.len()
            + self.static_thread.len()
            + self.dynamic_thread.len()
    }

    /// Reattaches lists that were detached for a fan-out pass.
    ///
    /// `self` holds whatever was registered while the pass ran; those
    /// entries go after the survivors so pre-existing registration order is
    /// preserved.
    pub(crate) fn restore(&mut self, mut kept: Self) {
        kept.static_method.append(&mut self.static_method);
        kept.dynamic_method.append(&mut self.dynamic_method);
        kept.static_thread.append(&mut self.static_thread);
        kept.dynamic_thread.append(&mut self.dynamic_thread);
        *self = kept;
    }
}

impl fmt::Debug for SensitivityLists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensitivityLists")
            .field("static_method", &self.static_method.len())
            .field("dynamic_method", &self.dynamic_method.len())
            .field("static_thread", &self.static_thread.len())
            .field("dynamic_thread", &self.dynamic_thread.len())
            .finish()
    }
}
