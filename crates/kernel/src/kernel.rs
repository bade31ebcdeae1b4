//! Kernel facade: one object per simulation session.
//!
//! The [`Kernel`] owns every piece of session state side-by-side — event
//! arena, scheduler, scope tree, name generator, statistics, and the shared
//! name registry — so the notification protocol can resolve handles without
//! ambient globals. It provides:
//! 1. **Construction/Destruction:** Declare events (hierarchical or
//!    internal) and destroy them, with name disambiguation and registry
//!    bookkeeping.
//! 2. **Notification:** Immediate fan-out, delayed scheduling with the
//!    earlier-deadline-wins merge, the strict no-merge variant, and
//!    idempotent cancellation.
//! 3. **Dispatch:** The time-ordered main loop — pop the batch at the
//!    minimum time, advance one change stamp per batch, fan out with the
//!    update phase held, repeat until quiescent.
//! 4. **Sensitivity:** Registration of static and dynamic waiters in the
//!    four per-event lists.

use std::fmt;
use std::mem;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::common::error::KernelError;
use crate::common::time::SimTime;
use crate::config::KernelConfig;
use crate::event::registry::EventRegistry;
use crate::event::sensitivity::{Interest, SenseKind, Waiter};
use crate::event::{EventArena, EventId, EventState, PendingNotify};
use crate::hierarchy::{ScopeId, ScopeTree};
use crate::naming::UniqueNameGen;
use crate::sched::Scheduler;
use crate::sched::queue::Entry;
use crate::stats::KernelStats;

/// The event/scheduler kernel for one simulation session.
///
/// Created at session start and torn down at session end; every event,
/// scope, and pending notification lives inside it. Component models hold
/// copyable [`EventId`]/[`ScopeId`] handles and call back into the kernel.
pub struct Kernel {
    config: KernelConfig,
    registry: Arc<EventRegistry>,
    events: EventArena,
    scopes: ScopeTree,
    /// Ambient construction context: innermost open scope parents new
    /// hierarchical events.
    build_stack: Vec<ScopeId>,
    names: UniqueNameGen,
    sched: Scheduler,
    stats: KernelStats,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl Kernel {
    /// Creates a session with the given configuration.
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            registry: Arc::new(EventRegistry::default()),
            events: EventArena::default(),
            scopes: ScopeTree::default(),
            build_stack: Vec::new(),
            names: UniqueNameGen::default(),
            sched: Scheduler::default(),
            stats: KernelStats::default(),
        }
    }

    // ------------------------------------------------------------------
    // Construction context (scopes)
    // ------------------------------------------------------------------

    /// Opens a named scope under the current one and makes it the ambient
    /// parent for events declared until the matching [`Kernel::close_scope`].
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::StructuralChange`] while the scheduler is
    /// inside its update phase.
    pub fn open_scope(&mut self, basename: &str) -> Result<ScopeId, KernelError> {
        if self.sched.in_update {
            return Err(KernelError::StructuralChange);
        }
        let parent = self.build_stack.last().copied();
        let scope = self.scopes.add_scope(parent, basename);
        self.build_stack.push(scope);
        Ok(scope)
    }

    /// Closes the innermost open scope.
    pub fn close_scope(&mut self) {
        debug_assert!(!self.build_stack.is_empty(), "close_scope with none open");
        let _ = self.build_stack.pop();
    }

    /// The innermost open scope, if any.
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.build_stack.last().copied()
    }

    /// Full dot-separated path of `scope`.
    pub fn scope_path(&self, scope: ScopeId) -> &str {
        self.scopes.path(scope)
    }

    /// Events currently registered under `scope`.
    pub fn child_events(&self, scope: ScopeId) -> &[EventId] {
        self.scopes.child_events(scope)
    }

    // ------------------------------------------------------------------
    // Event construction and destruction
    // ------------------------------------------------------------------

    /// Declares a hierarchical event.
    ///
    /// The parent is the innermost open scope, if any; the basename is
    /// disambiguated against existing names (a rename is reported as a
    /// warning and counted, and the run continues under the assigned name).
    /// An empty basename receives a generated one. The full name is
    /// `parent_path.basename`, or the bare basename at the top level.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::StructuralChange`] while the scheduler is
    /// inside its update phase.
    pub fn new_event(&mut self, basename: &str) -> Result<EventId, KernelError> {
        if self.sched.in_update {
            return Err(KernelError::StructuralChange);
        }
        let parent = self.build_stack.last().copied();
        let requested = if basename.is_empty() {
            let base = self.config.name_base().to_string();
            self.names.generate(&base)
        } else {
            basename.to_string()
        };
        let base = self.unique_basename(parent, &requested);
        let name = self.compose(parent, &base);
        if base != requested {
            let wanted = self.compose(parent, &requested);
            warn!(
                requested = %wanted,
                assigned = %name,
                "event name already exists; latter declaration renamed"
            );
            self.stats.naming_collisions += 1;
        }

        let id = self
            .events
            .insert(EventState::new(name.clone(), base, parent, false));
        if let Some(scope) = parent {
            self.scopes.add_child_event(scope, id);
        }
        self.registry.insert(&name, id, parent.is_none());
        self.stats.events_created += 1;
        Ok(id)
    }

    /// Declares an internal event.
    ///
    /// Internal events sit outside the hierarchy: they receive a
    /// generator-produced globally unique name, have no parent, and are
    /// registered only in the "all events" collection.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::StructuralChange`] while the scheduler is
    /// inside its update phase.
    pub fn new_internal_event(&mut self, basename: &str) -> Result<EventId, KernelError> {
        if self.sched.in_update {
            return Err(KernelError::StructuralChange);
        }
        let base = if basename.is_empty() {
            self.config.name_base().to_string()
        } else {
            basename.to_string()
        };
        let mut name = self.names.generate(&base);
        while self.registry.contains(&name) {
            name = self.names.generate(&base);
        }
        let id = self
            .events
            .insert(EventState::new(name.clone(), name.clone(), None, true));
        self.registry.insert(&name, id, false);
        self.stats.events_created += 1;
        Ok(id)
    }

    /// Destroys an event.
    ///
    /// Deregisters it from its parent's child list (or the top-level
    /// collection), removes it from the "all events" collection, and cancels
    /// any pending delayed notification so the queue never invokes a
    /// dangling callback.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn destroy_event(&mut self, event: EventId) -> Result<(), KernelError> {
        let Some(state) = self.events.remove(event) else {
            return Err(KernelError::UnknownEvent);
        };
        if let Some(scope) = state.parent {
            self.scopes.remove_child_event(scope, event);
            self.registry.remove(&state.name, false);
        } else {
            self.registry.remove(&state.name, !state.internal);
        }
        if state.pending.is_some() {
            // The queue entry is now stale; the dispatch loop skips it.
            self.stats.cancellations += 1;
        }
        self.stats.events_destroyed += 1;
        Ok(())
    }

    /// Detaches an event from its parent and re-registers it as top-level.
    ///
    /// A no-op for events that are already top-level. The event keeps its
    /// full name.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn clear_parent(&mut self, event: EventId) -> Result<(), KernelError> {
        let Some(state) = self.events.get_mut(event) else {
            return Err(KernelError::UnknownEvent);
        };
        let Some(scope) = state.parent.take() else {
            return Ok(());
        };
        let name = state.name.clone();
        self.scopes.remove_child_event(scope, event);
        self.registry.promote(&name, event);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------

    /// Notifies an event immediately.
    ///
    /// Cancels any pending delayed notification (immediate supersedes
    /// delayed), stamps the event as triggered in the current round, and
    /// synchronously fans out to the four sensitivity lists in fixed order.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ImmediateNotifyInUpdate`] while the scheduler
    /// is fanning out a round: delivery order would become
    /// observer-dependent, so this is rejected before any state mutation.
    /// Returns [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn notify_now(&mut self, event: EventId) -> Result<(), KernelError> {
        if self.sched.in_update {
            let event = self
                .events
                .get(event)
                .map_or_else(|| "<unknown>".to_string(), |state| state.name.clone());
            return Err(KernelError::ImmediateNotifyInUpdate { event });
        }
        let stamp = self.sched.change_stamp;
        let Some(state) = self.events.get_mut(event) else {
            return Err(KernelError::UnknownEvent);
        };
        if state.pending.take().is_some() {
            self.stats.cancellations += 1;
        }
        state.triggered_stamp = stamp;
        self.stats.immediate_notifications += 1;
        self.fan_out(event);
        Ok(())
    }

    /// Schedules a delayed notification `delay` ticks from now.
    ///
    /// At most one delayed notification is pending per event. When one is
    /// already pending, the earlier deadline wins: a request that fires no
    /// later than the pending one replaces it, and a later request is
    /// silently dropped (observable via the `delayed_merged` counter).
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn notify_in(&mut self, event: EventId, delay: SimTime) -> Result<(), KernelError> {
        let when = self.sched.now.plus(delay);
        let Some(state) = self.events.get_mut(event) else {
            return Err(KernelError::UnknownEvent);
        };
        if let Some(pending) = state.pending {
            if when >= pending.when {
                self.stats.delayed_merged += 1;
                return Ok(());
            }
            // The old queue entry goes stale once the handle is replaced.
            self.stats.delayed_superseded += 1;
        }
        let seq = self.sched.queue.schedule(when, event);
        state.pending = Some(PendingNotify { when, seq });
        self.stats.delayed_notifications += 1;
        Ok(())
    }

    /// Strict variant of [`Kernel::notify_in`].
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DelayedNotifyPending`] instead of merging when
    /// a delayed notification is already pending, for callers that must
    /// detect the scheduling conflict. Returns
    /// [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn notify_delayed(&mut self, event: EventId, delay: SimTime) -> Result<(), KernelError> {
        let Some(state) = self.events.get(event) else {
            return Err(KernelError::UnknownEvent);
        };
        if state.pending.is_some() {
            return Err(KernelError::DelayedNotifyPending {
                event: state.name.clone(),
            });
        }
        self.notify_in(event, delay)
    }

    /// Cancels the pending delayed notification, if any.
    ///
    /// Idempotent: cancelling with nothing pending is a no-op, callable any
    /// number of times.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn cancel(&mut self, event: EventId) -> Result<(), KernelError> {
        let Some(state) = self.events.get_mut(event) else {
            return Err(KernelError::UnknownEvent);
        };
        if state.pending.take().is_some() {
            self.stats.cancellations += 1;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sensitivity registration
    // ------------------------------------------------------------------

    /// Registers a waiter that stays on the event's list forever.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn add_static_waiter<W>(
        &mut self,
        event: EventId,
        kind: SenseKind,
        waiter: W,
    ) -> Result<(), KernelError>
    where
        W: Waiter + 'static,
    {
        let Some(state) = self.events.get_mut(event) else {
            return Err(KernelError::UnknownEvent);
        };
        match kind {
            SenseKind::Method => state.senses.static_method.push(Box::new(waiter)),
            SenseKind::Thread => state.senses.static_thread.push(Box::new(waiter)),
        }
        Ok(())
    }

    /// Registers a waiter that is pruned once it reports no further
    /// interest.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEvent`] if the handle is stale.
    pub fn add_dynamic_waiter<W>(
        &mut self,
        event: EventId,
        kind: SenseKind,
        waiter: W,
    ) -> Result<(), KernelError>
    where
        W: Waiter + 'static,
    {
        let Some(state) = self.events.get_mut(event) else {
            return Err(KernelError::UnknownEvent);
        };
        match kind {
            SenseKind::Method => state.senses.dynamic_method.push(Box::new(waiter)),
            SenseKind::Thread => state.senses.dynamic_thread.push(Box::new(waiter)),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Runs the dispatch loop until the queue is quiescent.
    ///
    /// A quiescent kernel simply returns; whether that is a deadlock is for
    /// the embedding driver to judge.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DeltaLimitExceeded`] when one instant exceeds
    /// the configured delta-round limit.
    pub fn run(&mut self) -> Result<(), KernelError> {
        while let Some(t) = self.next_live_time() {
            self.dispatch_round(t)?;
        }
        Ok(())
    }

    /// Runs the dispatch loop through `horizon` inclusive, then leaves the
    /// clock at `horizon`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DeltaLimitExceeded`] when one instant exceeds
    /// the configured delta-round limit.
    pub fn run_until(&mut self, horizon: SimTime) -> Result<(), KernelError> {
        while let Some(t) = self.next_live_time() {
            if t > horizon {
                break;
            }
            self.dispatch_round(t)?;
        }
        self.sched.advance_to(horizon);
        Ok(())
    }

    /// Dispatches a single delta round.
    ///
    /// Returns `false` when the queue is quiescent and nothing ran.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DeltaLimitExceeded`] when the current instant
    /// exceeds the configured delta-round limit.
    pub fn step(&mut self) -> Result<bool, KernelError> {
        match self.next_live_time() {
            Some(t) => {
                self.dispatch_round(t)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Skims stale entries off the queue head and returns the next instant
    /// at which a live notification fires.
    fn next_live_time(&mut self) -> Option<SimTime> {
        while let Some(entry) = self.sched.queue.peek().copied() {
            if self.entry_is_live(&entry) {
                return Some(entry.when);
            }
            let _ = self.sched.queue.pop();
        }
        None
    }

    /// A queue entry is live while it is still the one recorded in its
    /// owner's pending handle.
    fn entry_is_live(&self, entry: &Entry) -> bool {
        self.events
            .get(entry.event)
            .and_then(|state| state.pending)
            .is_some_and(|pending| pending.seq == entry.seq)
    }

    /// Pops and dispatches the whole batch scheduled for instant `t`.
    ///
    /// The change stamp advances exactly once for the batch, so co-scheduled
    /// events share one round and see each other's `triggered()`.
    fn dispatch_round(&mut self, t: SimTime) -> Result<(), KernelError> {
        self.sched.advance_to(t);
        self.sched.rounds_at_now += 1;
        if let Some(limit) = self.config.delta_limit {
            if self.sched.rounds_at_now > limit {
                return Err(KernelError::DeltaLimitExceeded { limit, at: t });
            }
        }

        let mut batch = Vec::new();
        while self.sched.queue.peek().is_some_and(|entry| entry.when == t) {
            if let Some(entry) = self.sched.queue.pop() {
                if self.entry_is_live(&entry) {
                    batch.push(entry);
                }
            }
        }

        self.sched.change_stamp += 1;
        let stamp = self.sched.change_stamp;
        self.sched.in_update = true;
        self.stats.delta_rounds += 1;
        if self.config.trace_dispatch {
            debug!(time = t.val(), callbacks = batch.len(), "delta round");
        }

        for entry in batch {
            let Some(state) = self.events.get_mut(entry.event) else {
                continue; // destroyed by an earlier callback this round
            };
            match state.pending {
                Some(pending) if pending.seq == entry.seq => {}
                _ => continue, // cancelled by an earlier callback this round
            }
            state.pending = None;
            state.triggered_stamp = stamp;
            self.stats.dispatched_callbacks += 1;
            self.fan_out(entry.event);
        }

        self.sched.in_update = false;
        Ok(())
    }

    /// Fans a firing event out to its four lists in the fixed order:
    /// static-method, dynamic-method, static-thread, dynamic-thread.
    ///
    /// The lists are detached for the pass so waiters may re-enter the
    /// kernel; registrations made against the firing event while the pass
    /// runs take effect afterwards.
    fn fan_out(&mut self, event: EventId) {
        let Some(state) = self.events.get_mut(event) else {
            return;
        };
        let mut lists = mem::take(&mut state.senses);
        self.deliver_static(&mut lists.static_method, event);
        self.deliver_dynamic(&mut lists.dynamic_method, event);
        self.deliver_static(&mut lists.static_thread, event);
        self.deliver_dynamic(&mut lists.dynamic_thread, event);
        if let Some(state) = self.events.get_mut(event) {
            state.senses.restore(lists);
        }
    }

    fn deliver_static(&mut self, list: &mut [Box<dyn Waiter>], event: EventId) {
        for waiter in list.iter_mut() {
            self.stats.waiter_notifications += 1;
            let _ = waiter.on_event(self, event);
        }
    }

    /// Dynamic delivery prunes entries that report no further interest by
    /// swapping with the last live entry, so remaining iteration is
    /// undisturbed.
    fn deliver_dynamic(&mut self, list: &mut Vec<Box<dyn Waiter>>, event: EventId) {
        let mut live = list.len();
        let mut pos = 0;
        while pos < live {
            self.stats.waiter_notifications += 1;
            match list[pos].on_event(self, event) {
                Interest::Keep => pos += 1,
                Interest::Done => {
                    live -= 1;
                    list.swap(pos, live);
                    self.stats.dynamic_prunes += 1;
                }
            }
        }
        list.truncate(live);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether the event fired during the round that is logically "now".
    ///
    /// Remains correct when queried from a waiter invoked by that very
    /// firing. Stale handles answer `false`.
    pub fn triggered(&self, event: EventId) -> bool {
        self.events
            .get(event)
            .is_some_and(|state| state.triggered_stamp == self.sched.change_stamp)
    }

    /// Full dot-separated name of the event.
    pub fn name(&self, event: EventId) -> Option<&str> {
        self.events.get(event).map(|state| state.name.as_str())
    }

    /// Final (possibly disambiguated) basename of the event.
    pub fn basename(&self, event: EventId) -> Option<&str> {
        self.events.get(event).map(|state| state.basename.as_str())
    }

    /// Whether the event participates in the naming hierarchy (false for
    /// internal events and stale handles).
    pub fn in_hierarchy(&self, event: EventId) -> bool {
        self.events.get(event).is_some_and(|state| !state.internal)
    }

    /// Parent scope of the event, if any.
    pub fn parent(&self, event: EventId) -> Option<ScopeId> {
        self.events.get(event).and_then(|state| state.parent)
    }

    /// Fire time of the pending delayed notification, if one is pending.
    pub fn pending_notification(&self, event: EventId) -> Option<SimTime> {
        self.events
            .get(event)
            .and_then(|state| state.pending)
            .map(|pending| pending.when)
    }

    /// Registered waiters on the event, across all four lists.
    pub fn waiter_count(&self, event: EventId) -> usize {
        self.events
            .get(event)
            .map_or(0, |state| state.senses.len())
    }

    /// Global exact-name lookup across all live events, independent of
    /// hierarchy. A miss is an ordinary result, never an error.
    pub fn find_event(&self, name: &str) -> Option<EventId> {
        self.registry.find(name)
    }

    /// Shared handle to the name registry, for diagnostic contexts on other
    /// threads.
    pub fn registry(&self) -> Arc<EventRegistry> {
        Arc::clone(&self.registry)
    }

    /// Current simulated time.
    pub const fn now(&self) -> SimTime {
        self.sched.now
    }

    /// Change stamp of the current round.
    pub const fn change_stamp(&self) -> u64 {
        self.sched.change_stamp
    }

    /// Whether the scheduler is inside its update phase.
    pub const fn in_update(&self) -> bool {
        self.sched.in_update
    }

    /// Number of live events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Session activity counters.
    pub fn stats(&self) -> &KernelStats {
        &self.stats
    }

    // ------------------------------------------------------------------
    // Naming helpers
    // ------------------------------------------------------------------

    fn compose(&self, parent: Option<ScopeId>, base: &str) -> String {
        match parent {
            Some(scope) => format!("{}.{}", self.scopes.path(scope), base),
            None => base.to_string(),
        }
    }

    /// Bumps `want` with `_N` suffixes until the composed full name is
    /// unique among all live events.
    fn unique_basename(&self, parent: Option<ScopeId>, want: &str) -> String {
        let mut candidate = want.to_string();
        let mut suffix = 0u64;
        while self.registry.contains(&self.compose(parent, &candidate)) {
            candidate = format!("{want}_{suffix}");
            suffix += 1;
        }
        candidate
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("now", &self.sched.now)
            .field("events", &self.events.len())
            .field("queued", &self.sched.queue.len())
            .field("change_stamp", &self.sched.change_stamp)
            .field("in_update", &self.sched.in_update)
            .finish_non_exhaustive()
    }
}
