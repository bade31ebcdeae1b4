//! Event objects and their storage.
//!
//! An event is the kernel's notification primitive: "something will happen
//! at simulated time T, observed by a set of waiters." This module provides:
//! 1. **Identity:** Copyable [`EventId`] handles with generation counters, so
//!    a handle kept across its event's destruction is detected instead of
//!    silently addressing a recycled slot.
//! 2. **State:** Per-event name, parent scope, triggered stamp, and the
//!    at-most-one pending delayed-notification handle.
//! 3. **Storage:** The session-owned arena the kernel resolves handles
//!    against.
//!
//! The notification protocol itself (immediate fan-out, delayed scheduling,
//! cancellation) lives on the kernel facade, which owns this arena alongside
//! the scheduler.

/// Name registry for live events.
pub mod registry;
/// Waiter abstraction and per-event sensitivity lists.
pub mod sensitivity;

use crate::common::time::SimTime;
use crate::hierarchy::ScopeId;
use sensitivity::SensitivityLists;

/// Stamp value meaning "has never triggered".
///
/// The change stamp is a count of delta rounds and cannot plausibly reach
/// this value within a session.
pub(crate) const NEVER_TRIGGERED: u64 = u64::MAX;

/// Handle to a live event.
///
/// Handles are plain copyable values; all operations on an event go through
/// the kernel that owns it. A handle outliving its event stays safe: the
/// generation counter makes the kernel report it as unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl EventId {
    /// Builds an arbitrary handle for data-structure tests.
    #[cfg(test)]
    pub(crate) const fn test_handle(index: u32) -> Self {
        Self {
            index,
            generation: 0,
        }
    }
}

/// A pending delayed notification.
///
/// At most one exists per event. The sequence number identifies the live
/// entry in the notification queue; queue entries whose sequence no longer
/// matches are stale and are skipped by the dispatch loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PendingNotify {
    /// Absolute instant the notification fires at.
    pub(crate) when: SimTime,
    /// Queue sequence number of the live entry.
    pub(crate) seq: u64,
}

/// Per-event kernel state.
#[derive(Debug)]
pub(crate) struct EventState {
    /// Full dot-separated name, globally unique among live events.
    pub(crate) name: String,
    /// Final (possibly disambiguated) basename.
    pub(crate) basename: String,
    /// Parent scope handle; `None` for top-level and internal events.
    pub(crate) parent: Option<ScopeId>,
    /// Internal events are excluded from the hierarchy and the top-level
    /// registry; they still carry globally unique names.
    pub(crate) internal: bool,
    /// Change stamp of the round this event last fired in.
    pub(crate) triggered_stamp: u64,
    /// The at-most-one pending delayed notification.
    pub(crate) pending: Option<PendingNotify>,
    /// The four waiter lists notified when this event fires.
    pub(crate) senses: SensitivityLists,
}

impl EventState {
    pub(crate) fn new(
        name: String,
        basename: String,
        parent: Option<ScopeId>,
        internal: bool,
    ) -> Self {
        Self {
            name,
            basename,
            parent,
            internal,
            triggered_stamp: NEVER_TRIGGERED,
            pending: None,
            senses: SensitivityLists::default(),
        }
    }
}

/// Arena slot: the generation survives removal so stale handles miss.
#[derive(Debug)]
struct Slot {
    generation: u32,
    state: Option<EventState>,
}

/// Session-owned storage for event state.
///
/// Slots are recycled through a free list; each reuse bumps the slot's
/// generation so handles to the previous occupant stop resolving.
#[derive(Debug, Default)]
pub(crate) struct EventArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EventArena {
    /// Stores `state` and returns its handle.
    pub(crate) fn insert(&mut self, state: EventState) -> EventId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.state = Some(state);
            EventId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                state: Some(state),
            });
            EventId {
                index,
                generation: 0,
            }
        }
    }

    /// Resolves a handle to its state, if the event is still live.
    pub(crate) fn get(&self, id: EventId) -> Option<&EventState> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.state.as_ref())
    }

    /// Mutable variant of [`EventArena::get`].
    pub(crate) fn get_mut(&mut self, id: EventId) -> Option<&mut EventState> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.state.as_mut())
    }

    /// Removes and returns the state for `id`, invalidating the handle.
    pub(crate) fn remove(&mut self, id: EventId) -> Option<EventState> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let state = slot.state.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(state)
    }

    /// Number of live events.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
