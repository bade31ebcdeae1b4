//! Dispatch-Loop Unit Tests.
//!
//! Verifies time ordering, FIFO among equal instants, shared change stamps
//! within a round, delta-cycle re-evaluation at one instant, the update
//! phase ban on immediate notification, and the runaway-round diagnostic.

use std::cell::RefCell;
use std::rc::Rc;

use evsim_core::{EventId, Interest, Kernel, KernelConfig, KernelError, SenseKind, SimTime};
use pretty_assertions::assert_eq;

use crate::common::FireLog;

#[test]
fn fires_in_time_order() {
    let mut kernel = Kernel::default();
    let log = FireLog::new();
    for (tag, delay) in [("late", 30), ("early", 10), ("mid", 20)] {
        let ev = kernel.new_event(tag).unwrap();
        kernel
            .add_static_waiter(ev, SenseKind::Method, log.recorder(tag))
            .unwrap();
        kernel.notify_in(ev, SimTime::new(delay)).unwrap();
    }

    kernel.run().unwrap();
    assert_eq!(
        log.entries(),
        vec!["early".to_string(), "mid".to_string(), "late".to_string()]
    );
    assert_eq!(kernel.now(), SimTime::new(30));
}

#[test]
fn fifo_among_equal_times() {
    let mut kernel = Kernel::default();
    let log = FireLog::new();
    let a = kernel.new_event("a").unwrap();
    let b = kernel.new_event("b").unwrap();
    kernel
        .add_static_waiter(a, SenseKind::Method, log.recorder("a"))
        .unwrap();
    kernel
        .add_static_waiter(b, SenseKind::Method, log.recorder("b"))
        .unwrap();

    // A scheduled before B at the identical instant fires first.
    kernel.notify_in(a, SimTime::new(5)).unwrap();
    kernel.notify_in(b, SimTime::new(5)).unwrap();
    kernel.run().unwrap();
    assert_eq!(log.entries(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn co_scheduled_events_share_one_round() {
    let mut kernel = Kernel::default();
    let a = kernel.new_event("a").unwrap();
    let b = kernel.new_event("b").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));

    // B's waiter observes A's triggered() within the shared round.
    let observed = Rc::clone(&seen);
    kernel
        .add_static_waiter(b, SenseKind::Method, move |k: &mut Kernel, _e: EventId| {
            observed.borrow_mut().push(k.triggered(a));
            Interest::Keep
        })
        .unwrap();

    kernel.notify_in(a, SimTime::new(5)).unwrap();
    kernel.notify_in(b, SimTime::new(5)).unwrap();
    kernel.run().unwrap();
    assert_eq!(*seen.borrow(), vec![true]);
}

#[test]
fn zero_delay_notification_forms_a_new_delta_round() {
    let mut kernel = Kernel::default();
    let a = kernel.new_event("a").unwrap();
    let b = kernel.new_event("b").unwrap();
    let log = FireLog::new();
    let stamps = Rc::new(RefCell::new(Vec::new()));

    let tap = Rc::clone(&stamps);
    kernel
        .add_static_waiter(a, SenseKind::Method, move |k: &mut Kernel, _e: EventId| {
            tap.borrow_mut().push(k.change_stamp());
            let _ = k.notify_in(b, SimTime::ZERO);
            Interest::Keep
        })
        .unwrap();
    let tap = Rc::clone(&stamps);
    kernel
        .add_static_waiter(b, SenseKind::Method, move |k: &mut Kernel, _e: EventId| {
            tap.borrow_mut().push(k.change_stamp());
            Interest::Keep
        })
        .unwrap();
    kernel
        .add_static_waiter(a, SenseKind::Method, log.recorder("a"))
        .unwrap();
    kernel
        .add_static_waiter(b, SenseKind::Method, log.recorder("b"))
        .unwrap();

    kernel.notify_in(a, SimTime::new(5)).unwrap();
    kernel.run().unwrap();

    // Same instant, two rounds: B fires after A with a fresh stamp.
    assert_eq!(log.entries(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(kernel.now(), SimTime::new(5));
    let stamps = stamps.borrow();
    assert_eq!(stamps.len(), 2);
    assert_eq!(stamps[1], stamps[0] + 1);
}

#[test]
fn immediate_notify_inside_a_round_is_a_usage_fault() {
    let mut kernel = Kernel::default();
    let a = kernel.new_event("a").unwrap();
    let b = kernel.new_event("b").unwrap();
    let failure = Rc::new(RefCell::new(None));

    let observed = Rc::clone(&failure);
    kernel
        .add_static_waiter(a, SenseKind::Method, move |k: &mut Kernel, _e: EventId| {
            let _ = observed.borrow_mut().insert(k.notify_now(b).unwrap_err());
            Interest::Keep
        })
        .unwrap();

    kernel.notify_in(a, SimTime::new(1)).unwrap();
    kernel.run().unwrap();
    assert_eq!(
        failure.borrow().clone(),
        Some(KernelError::ImmediateNotifyInUpdate {
            event: "b".to_string()
        })
    );
    // The rejected notification left no trace.
    assert!(!kernel.triggered(b));
}

#[test]
fn update_phase_clears_after_each_round() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let tap = Rc::clone(&seen);
    kernel
        .add_static_waiter(ev, SenseKind::Method, move |k: &mut Kernel, _e: EventId| {
            tap.borrow_mut().push(k.in_update());
            Interest::Keep
        })
        .unwrap();

    kernel.notify_in(ev, SimTime::new(1)).unwrap();
    kernel.run().unwrap();
    assert_eq!(*seen.borrow(), vec![true]);
    assert!(!kernel.in_update());

    // Immediate notification is legal again once the loop returns.
    kernel.notify_now(ev).unwrap();
}

#[test]
fn cancellation_by_a_co_scheduled_callback_wins() {
    let mut kernel = Kernel::default();
    let a = kernel.new_event("a").unwrap();
    let b = kernel.new_event("b").unwrap();
    let log = FireLog::new();

    kernel
        .add_static_waiter(a, SenseKind::Method, move |k: &mut Kernel, _e: EventId| {
            let _ = k.cancel(b);
            Interest::Keep
        })
        .unwrap();
    kernel
        .add_static_waiter(b, SenseKind::Method, log.recorder("b"))
        .unwrap();

    // A is scheduled first, so its callback runs first and cancels B.
    kernel.notify_in(a, SimTime::new(5)).unwrap();
    kernel.notify_in(b, SimTime::new(5)).unwrap();
    kernel.run().unwrap();
    assert!(log.is_empty());
}

#[test]
fn run_until_stops_at_the_horizon() {
    let mut kernel = Kernel::default();
    let ev = kernel.new_event("req").unwrap();
    let log = FireLog::new();
    kernel
        .add_static_waiter(ev, SenseKind::Method, log.recorder("req"))
        .unwrap();
    kernel.notify_in(ev, SimTime::new(10)).unwrap();

    kernel.run_until(SimTime::new(7)).unwrap();
    assert!(log.is_empty());
    assert_eq!(kernel.now(), SimTime::new(7));
    assert_eq!(kernel.pending_notification(ev), Some(SimTime::new(10)));

    kernel.run_until(SimTime::new(12)).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(kernel.now(), SimTime::new(12));
}

#[test]
fn step_dispatches_one_round_at_a_time() {
    let mut kernel = Kernel::default();
    let a = kernel.new_event("a").unwrap();
    let b = kernel.new_event("b").unwrap();
    let log = FireLog::new();
    kernel
        .add_static_waiter(a, SenseKind::Method, log.recorder("a"))
        .unwrap();
    kernel
        .add_static_waiter(b, SenseKind::Method, log.recorder("b"))
        .unwrap();
    kernel.notify_in(a, SimTime::new(1)).unwrap();
    kernel.notify_in(b, SimTime::new(2)).unwrap();

    assert!(kernel.step().unwrap());
    assert_eq!(log.entries(), vec!["a".to_string()]);
    assert!(kernel.step().unwrap());
    assert_eq!(log.len(), 2);
    assert!(!kernel.step().unwrap(), "quiescent kernel has nothing to run");
}

#[test]
fn a_quiescent_kernel_returns_immediately() {
    let mut kernel = Kernel::default();
    kernel.run().unwrap();
    assert_eq!(kernel.now(), SimTime::ZERO);
    assert_eq!(kernel.change_stamp(), 0);
}

#[test]
fn runaway_zero_delay_loop_hits_the_delta_limit() {
    let config = KernelConfig {
        delta_limit: Some(16),
        ..KernelConfig::default()
    };
    let mut kernel = Kernel::new(config);
    let ev = kernel.new_event("storm").unwrap();
    kernel
        .add_static_waiter(ev, SenseKind::Method, |k: &mut Kernel, e: EventId| {
            let _ = k.notify_in(e, SimTime::ZERO);
            Interest::Keep
        })
        .unwrap();

    kernel.notify_in(ev, SimTime::ZERO).unwrap();
    let err = kernel.run().unwrap_err();
    assert_eq!(
        err,
        KernelError::DeltaLimitExceeded {
            limit: 16,
            at: SimTime::ZERO
        }
    );
    assert!(!kernel.in_update(), "failed run must not stay in update phase");
}
