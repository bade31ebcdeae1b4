//! Event Lifecycle and Notification Unit Tests.
//!
//! Verifies the one-pending-notification invariant, the
//! earlier-deadline-wins merge policy, the strict `notify_delayed` variant,
//! triggered-stamp semantics, cancellation idempotency, and destruction
//! with a notification in flight.

use evsim_core::{EventId, Interest, Kernel, KernelError, SenseKind, SimTime};
use rstest::rstest;

use crate::common::FireLog;

#[test]
fn delayed_notify_schedules_at_now_plus_delay() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    kernel.notify_in(ev, SimTime::new(10)).unwrap();
    assert_eq!(kernel.pending_notification(ev), Some(SimTime::new(10)));

    kernel.run().unwrap();
    assert_eq!(kernel.now(), SimTime::new(10));
    assert_eq!(kernel.pending_notification(ev), None);
}

#[rstest]
#[case(10, 5, 5)] // earlier second request replaces the pending one
#[case(5, 10, 5)] // later second request is silently dropped
#[case(7, 7, 7)] // equal deadline keeps the pending entry
fn earlier_deadline_wins(#[case] first: u64, #[case] second: u64, #[case] fires_at: u64) {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    kernel.notify_in(ev, SimTime::new(first)).unwrap();
    kernel.notify_in(ev, SimTime::new(second)).unwrap();
    assert_eq!(
        kernel.pending_notification(ev),
        Some(SimTime::new(fires_at))
    );

    kernel.run().unwrap();
    assert_eq!(kernel.now(), SimTime::new(fires_at));
}

#[test]
fn at_most_one_pending_after_any_sequence() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    let log = FireLog::new();
    kernel
        .add_static_waiter(ev, SenseKind::Method, log.recorder("req"))
        .unwrap();

    kernel.notify_in(ev, SimTime::new(20)).unwrap();
    kernel.notify_in(ev, SimTime::new(30)).unwrap();
    kernel.notify_in(ev, SimTime::new(15)).unwrap();
    kernel.cancel(ev).unwrap();
    kernel.notify_delayed(ev, SimTime::new(8)).unwrap();
    assert_eq!(kernel.pending_notification(ev), Some(SimTime::new(8)));

    // Only the surviving request fires.
    kernel.run().unwrap();
    assert_eq!(log.entries(), vec!["req".to_string()]);
    assert_eq!(kernel.now(), SimTime::new(8));
}

#[test]
fn notify_delayed_rejects_a_second_pending() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    kernel.notify_delayed(ev, SimTime::new(5)).unwrap();

    let err = kernel.notify_delayed(ev, SimTime::new(3)).unwrap_err();
    assert_eq!(
        err,
        KernelError::DelayedNotifyPending {
            event: "req".to_string()
        }
    );
    // The rejected call left the original request untouched.
    assert_eq!(kernel.pending_notification(ev), Some(SimTime::new(5)));
}

#[test]
fn notify_delayed_is_legal_again_after_cancel() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    kernel.notify_delayed(ev, SimTime::new(5)).unwrap();
    kernel.cancel(ev).unwrap();
    kernel.notify_delayed(ev, SimTime::new(3)).unwrap();
    assert_eq!(kernel.pending_notification(ev), Some(SimTime::new(3)));
}

#[test]
fn immediate_notify_supersedes_pending_delayed() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    let log = FireLog::new();
    kernel
        .add_static_waiter(ev, SenseKind::Method, log.recorder("req"))
        .unwrap();

    kernel.notify_in(ev, SimTime::new(10)).unwrap();
    kernel.notify_now(ev).unwrap();
    assert_eq!(kernel.pending_notification(ev), None);

    // The superseded delayed notification never fires.
    kernel.run().unwrap();
    assert_eq!(log.len(), 1);
}

#[test]
fn triggered_until_the_next_stamp_advance() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    let other = kernel.new_event("other").unwrap();

    assert!(!kernel.triggered(ev));
    kernel.notify_now(ev).unwrap();
    assert!(kernel.triggered(ev));

    // The next delta round advances the stamp and clears "triggered now".
    kernel.notify_in(other, SimTime::new(1)).unwrap();
    kernel.run().unwrap();
    assert!(!kernel.triggered(ev));
    assert!(kernel.triggered(other));
}

#[test]
fn cancel_with_nothing_pending_is_idempotent() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    kernel.cancel(ev).unwrap();
    kernel.cancel(ev).unwrap();
    kernel.cancel(ev).unwrap();
    assert_eq!(kernel.pending_notification(ev), None);
    assert_eq!(kernel.stats().cancellations, 0);
}

#[test]
fn destroy_with_pending_prevents_the_callback() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("doomed").unwrap();
    let other = kernel.new_event("other").unwrap();
    let log = FireLog::new();
    kernel
        .add_static_waiter(ev, SenseKind::Method, log.recorder("doomed"))
        .unwrap();

    kernel.notify_in(ev, SimTime::new(10)).unwrap();
    kernel.destroy_event(ev).unwrap();

    // Advance well past the scheduled time; no fan-out may happen.
    kernel.notify_in(other, SimTime::new(20)).unwrap();
    kernel.run().unwrap();
    assert!(log.is_empty());
    assert_eq!(kernel.now(), SimTime::new(20));
}

#[test]
fn destroyed_handles_stop_resolving() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    kernel.destroy_event(ev).unwrap();

    assert_eq!(kernel.name(ev), None);
    assert_eq!(kernel.notify_now(ev), Err(KernelError::UnknownEvent));
    assert_eq!(
        kernel.notify_in(ev, SimTime::new(1)),
        Err(KernelError::UnknownEvent)
    );
    assert_eq!(kernel.cancel(ev), Err(KernelError::UnknownEvent));
    assert_eq!(kernel.destroy_event(ev), Err(KernelError::UnknownEvent));
    assert!(kernel.find_event("req").is_none());
}

#[test]
fn construction_is_rejected_mid_round() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    let log = FireLog::new();
    let observed = log.clone();
    kernel
        .add_static_waiter(ev, SenseKind::Method, move |k: &mut Kernel, _e: EventId| {
            if k.new_event("late") == Err(KernelError::StructuralChange) {
                observed.push("rejected");
            }
            Interest::Keep
        })
        .unwrap();

    kernel.notify_in(ev, SimTime::new(1)).unwrap();
    kernel.run().unwrap();
    assert_eq!(log.entries(), vec!["rejected".to_string()]);
}
