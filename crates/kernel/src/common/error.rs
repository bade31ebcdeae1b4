//! Kernel error definitions.
//!
//! This module defines the error taxonomy for the event kernel. It provides:
//! 1. **Usage Faults:** Contract violations by the embedding model code
//!    (illegal immediate notification, conflicting delayed notification,
//!    structural changes during evaluation). These are fatal: the embedding
//!    driver must halt the run, because continuing after an ordering
//!    guarantee has been violated is unsafe.
//! 2. **Invariant Violations:** Operations on handles that no longer refer
//!    to a live event.
//! 3. **Diagnostics:** The configurable same-instant round limit used to
//!    catch runaway zero-delay feedback loops.
//!
//! Advisory conditions (name-collision renames) are not errors; they are
//! reported through `tracing::warn!` and counted in the kernel statistics.

use thiserror::Error;

use super::time::SimTime;

/// Errors reported by kernel operations.
///
/// Every operation is either fully applied or rejected with one of these
/// before any state mutation; there is no partial-failure semantic inside
/// the kernel.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    /// Immediate notification was requested while the scheduler was fanning
    /// out notifications for the current instant.
    ///
    /// Allowing this would make delivery order observer-dependent, so it is
    /// rejected before any state is touched.
    #[error("immediate notification of '{event}' during the update phase")]
    ImmediateNotifyInUpdate {
        /// Full name of the event whose notification was rejected.
        event: String,
    },

    /// `notify_delayed` was called while a delayed notification was already
    /// pending for the event.
    ///
    /// The merging `notify_in` is the forgiving variant; this one exists for
    /// callers that must detect the scheduling conflict.
    #[error("notify_delayed on '{event}': a delayed notification is already pending")]
    DelayedNotifyPending {
        /// Full name of the event with the conflicting pending notification.
        event: String,
    },

    /// An event or scope was constructed (or a scope opened/closed) while
    /// the scheduler was inside its update phase.
    #[error("structural change while the scheduler is evaluating")]
    StructuralChange,

    /// The supplied handle does not refer to a live event.
    ///
    /// Raised when an event is used after destruction, or when a handle from
    /// a different session is passed in.
    #[error("operation on an unknown or destroyed event handle")]
    UnknownEvent,

    /// One simulated instant exceeded the configured number of delta rounds.
    ///
    /// This indicates a zero-delay notification feedback loop in the model;
    /// simulated time can never advance past `at`.
    #[error("delta-round limit of {limit} exceeded at {at}")]
    DeltaLimitExceeded {
        /// The configured round limit that was exceeded.
        limit: u64,
        /// The simulated instant that failed to converge.
        at: SimTime,
    },
}
