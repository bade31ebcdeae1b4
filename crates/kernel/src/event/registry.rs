//! Name registry for live events.
//!
//! The registry tracks existence and naming, never ordering. It holds two
//! collections: every live event ("all"), and the unparented, non-internal
//! subset ("top-level"). It provides:
//! 1. **Keyed Membership:** Insert and remove by name; uniqueness is the
//!    event constructor's responsibility, the registry is a dumb keyed
//!    container.
//! 2. **Lookup:** Exact-name search over all live events, returning a handle
//!    or nothing; a miss is an ordinary result, not an error.
//! 3. **Concurrency:** One process-wide read/write lock, shared for lookups
//!    and exclusive for mutation, so diagnostic threads can query names
//!    while the simulation thread constructs and destroys events.
//!
//! Collections are unordered sets semantically, so removal is a linear scan
//! followed by swap-with-last.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::event::EventId;

/// One named member of a registry collection.
#[derive(Clone, Debug)]
struct NamedEvent {
    name: String,
    id: EventId,
}

#[derive(Debug, Default)]
struct Collections {
    all: Vec<NamedEvent>,
    top_level: Vec<NamedEvent>,
}

/// Process-wide registry of live events, keyed by unique name.
///
/// The kernel owns one registry per session and shares it (`Arc`) with any
/// diagnostic context that wants name lookups; see
/// [`Kernel::registry`](crate::kernel::Kernel::registry).
#[derive(Debug, Default)]
pub struct EventRegistry {
    inner: RwLock<Collections>,
}

fn scan(list: &[NamedEvent], name: &str) -> Option<usize> {
    list.iter().position(|entry| entry.name == name)
}

fn pop(list: &mut Vec<NamedEvent>, name: &str) {
    let pos = scan(list, name);
    debug_assert!(pos.is_some(), "registry remove of absent name '{name}'");
    if let Some(pos) = pos {
        let _ = list.swap_remove(pos);
    }
}

impl EventRegistry {
    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a newly constructed event under `name`, into "all" and, when
    /// `top_level` is set, into the top-level collection as well.
    pub(crate) fn insert(&self, name: &str, id: EventId, top_level: bool) {
        let mut inner = self.write();
        debug_assert!(
            scan(&inner.all, name).is_none(),
            "duplicate event name '{name}' bypassed disambiguation"
        );
        inner.all.push(NamedEvent {
            name: name.to_string(),
            id,
        });
        if top_level {
            inner.top_level.push(NamedEvent {
                name: name.to_string(),
                id,
            });
        }
    }

    /// Removes a dying event, from the top-level collection when
    /// `top_level` is set and always from "all", under one exclusive lock.
    pub(crate) fn remove(&self, name: &str, top_level: bool) {
        let mut inner = self.write();
        if top_level {
            pop(&mut inner.top_level, name);
        }
        pop(&mut inner.all, name);
    }

    /// Re-registers an already-live event as top-level.
    ///
    /// Used when an event is detached from its parent after construction.
    pub(crate) fn promote(&self, name: &str, id: EventId) {
        let mut inner = self.write();
        debug_assert!(scan(&inner.top_level, name).is_none());
        inner.top_level.push(NamedEvent {
            name: name.to_string(),
            id,
        });
    }

    /// Looks up a live event by exact full name.
    pub fn find(&self, name: &str) -> Option<EventId> {
        let inner = self.read();
        scan(&inner.all, name).map(|pos| inner.all[pos].id)
    }

    /// Returns whether any live event carries `name`.
    pub fn contains(&self, name: &str) -> bool {
        scan(&self.read().all, name).is_some()
    }

    /// Number of live events.
    pub fn len(&self) -> usize {
        self.read().all.len()
    }

    /// Returns whether no events are live.
    pub fn is_empty(&self) -> bool {
        self.read().all.is_empty()
    }

    /// Number of live top-level events.
    pub fn top_level_len(&self) -> usize {
        self.read().top_level.len()
    }

    /// Snapshot of all live event names, for diagnostics.
    pub fn names(&self) -> Vec<String> {
        self.read()
            .all
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Snapshot of the top-level event names, for diagnostics.
    pub fn top_level_names(&self) -> Vec<String> {
        self.read()
            .top_level
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }
}
