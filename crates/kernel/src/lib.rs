//! Discrete-event simulation kernel.
//!
//! This crate implements the event/scheduler core beneath a hardware/software
//! co-simulation framework:
//! 1. **Events:** Named notification objects with hierarchical or internal
//!    identity, a triggered stamp, and at most one pending delayed
//!    notification.
//! 2. **Sensitivity:** Four waiter lists per event (static/dynamic crossed
//!    with method/thread) fanned out in a fixed, deterministic order.
//! 3. **Scheduler:** A time-ordered dispatch loop with delta-cycle
//!    semantics — FIFO among equal times, one change stamp per round, and
//!    an update phase that outlaws immediate notification mid-fan-out.
//! 4. **Registry:** Process-wide name collections guarded by a read/write
//!    lock, so diagnostic threads can look events up while the simulation
//!    thread constructs and destroys them.
//!
//! Create one [`Kernel`] per simulation session; declare events and waiters
//! through it; drive it with [`Kernel::run`], [`Kernel::run_until`], or
//! [`Kernel::step`].

/// Common types (simulated time, error taxonomy).
pub mod common;
/// Kernel configuration (defaults, JSON deserialization).
pub mod config;
/// Event state, identity, name registry, and sensitivity lists.
pub mod event;
/// Named-scope tree standing in for the ownership hierarchy.
pub mod hierarchy;
/// The session facade and dispatch loop.
pub mod kernel;
/// Unique-name generation.
mod naming;
/// Scheduler state and the time-ordered notification queue.
mod sched;
/// Session activity counters.
pub mod stats;

/// Kernel error taxonomy; fatal conditions halt the run.
pub use crate::common::error::KernelError;
/// Simulated-time tick type for instants and delays.
pub use crate::common::time::SimTime;
/// Session configuration; use `KernelConfig::default()` or deserialize from JSON.
pub use crate::config::KernelConfig;
/// Handle to a live event.
pub use crate::event::EventId;
/// Shared name registry handle for diagnostic lookups.
pub use crate::event::registry::EventRegistry;
/// Waiter abstraction for sensitivity registration.
pub use crate::event::sensitivity::{Interest, SenseKind, Waiter};
/// Handle to a scope in the session's naming tree.
pub use crate::hierarchy::ScopeId;
/// The event/scheduler kernel; one per simulation session.
pub use crate::kernel::Kernel;
/// Session activity counters.
pub use crate::stats::KernelStats;
