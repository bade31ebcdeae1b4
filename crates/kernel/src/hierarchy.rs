//! Named-scope tree.
//!
//! The full hierarchical object model of the surrounding framework is a
//! collaborator, not part of this kernel; what the kernel needs from it is
//! small and captured here:
//! 1. **Paths:** Dot-separated full names composed from scope basenames, used
//!    to build event names.
//! 2. **Child lists:** Each scope tracks the events registered under it, so
//!    sibling basenames can be disambiguated and events deregistered on
//!    destruction.
//! 3. **Identity:** Scopes are addressed by copyable [`ScopeId`] handles; an
//!    event's parent is an identifier, never an owning reference, so event
//!    lifetime is independent of parent traversal.

use crate::event::EventId;

/// Handle to a scope in the session's scope tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u32);

/// One node of the scope tree.
#[derive(Debug)]
struct ScopeNode {
    /// Full dot-separated path, fixed at creation.
    path: String,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    child_events: Vec<EventId>,
}

/// The session's tree of named scopes.
///
/// Scopes live for the whole session; the tree only grows. Destroying scopes
/// mid-run is an ownership-hierarchy concern that stays with the embedding
/// framework.
#[derive(Debug, Default)]
pub(crate) struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl ScopeTree {
    /// Adds a scope named `basename` under `parent` (or at the top level)
    /// and returns its handle.
    pub(crate) fn add_scope(&mut self, parent: Option<ScopeId>, basename: &str) -> ScopeId {
        let path = match parent {
            Some(p) => format!("{}.{}", self.path(p), basename),
            None => basename.to_string(),
        };
        let id = ScopeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(ScopeNode {
            path,
            parent,
            children: Vec::new(),
            child_events: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.0 as usize].children.push(id);
        }
        id
    }

    /// Returns the full dot-separated path of `scope`.
    pub(crate) fn path(&self, scope: ScopeId) -> &str {
        &self.nodes[scope.0 as usize].path
    }

    /// Returns the parent of `scope`, if it has one.
    pub(crate) fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.nodes[scope.0 as usize].parent
    }

    /// Registers `event` in the child list of `scope`.
    pub(crate) fn add_child_event(&mut self, scope: ScopeId, event: EventId) {
        self.nodes[scope.0 as usize].child_events.push(event);
    }

    /// Removes `event` from the child list of `scope`.
    ///
    /// Order within the list is not meaningful, so removal swaps with the
    /// last entry and pops.
    pub(crate) fn remove_child_event(&mut self, scope: ScopeId, event: EventId) {
        let events = &mut self.nodes[scope.0 as usize].child_events;
        let pos = events.iter().position(|e| *e == event);
        debug_assert!(pos.is_some(), "event not registered under its parent");
        if let Some(pos) = pos {
            let _ = events.swap_remove(pos);
        }
    }

    /// Returns the events currently registered under `scope`.
    pub(crate) fn child_events(&self, scope: ScopeId) -> &[EventId] {
        &self.nodes[scope.0 as usize].child_events
    }
}
