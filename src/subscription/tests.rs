use std::{cell::Cell, rc::Rc};

use assert_call::{call, CallRecorder};

use super::*;

#[test]
fn ids_start_at_one_and_increment() {
    let subs = Subscribers::new();
    let a = subs.subscribe(|| {});
    let b = subs.subscribe(|| {});
    assert_eq!(a.to_string(), "#1");
    assert_eq!(b.to_string(), "#2");
}

#[test]
fn ids_are_never_reused() {
    let subs = Subscribers::new();
    let a = subs.subscribe(|| {});
    subs.unsubscribe(a);
    let b = subs.subscribe(|| {});
    assert_ne!(a, b);
    assert_eq!(b.to_string(), "#2");
}

#[test]
fn notify_all_runs_in_ascending_id_order() {
    let mut cr = CallRecorder::new();
    let subs = Subscribers::new();
    let _a = subs.subscribe(|| call!("a"));
    let _b = subs.subscribe(|| call!("b"));
    let _c = subs.subscribe(|| call!("c"));
    subs.notify_all();
    cr.verify(["a", "b", "c"]);
}

#[test]
fn live_callback_count_tracks_subscribes_minus_unsubscribes() {
    let subs = Subscribers::new();
    let count = Rc::new(Cell::new(0));
    let mut ids = Vec::new();
    for _ in 0..5 {
        let count = count.clone();
        ids.push(subs.subscribe(move || count.set(count.get() + 1)));
    }
    subs.unsubscribe(ids[1]);
    subs.unsubscribe(ids[3]);
    assert_eq!(subs.len(), 3);
    subs.notify_all();
    assert_eq!(count.get(), 3);
}

#[test]
fn unsubscribe_unknown_id_is_a_noop() {
    let subs = Subscribers::new();
    let a = subs.subscribe(|| {});
    subs.unsubscribe(a);
    subs.unsubscribe(a);
    subs.notify_all();
}

#[test]
fn callback_can_unsubscribe_a_later_one_mid_cycle() {
    let mut cr = CallRecorder::new();
    let subs = Rc::new(Subscribers::new());
    let subs2 = subs.clone();
    let _a = subs.subscribe(move || {
        call!("a");
        // `b` has the next id and has not run yet this cycle.
        subs2.unsubscribe(SubscriberId(2));
    });
    let _b = subs.subscribe(|| call!("b"));
    let _c = subs.subscribe(|| call!("c"));
    subs.notify_all();
    cr.verify(["a", "c"]);
}

#[test]
fn callback_can_subscribe_mid_cycle_without_being_notified() {
    let mut cr = CallRecorder::new();
    let subs = Rc::new(Subscribers::new());
    let subs2 = subs.clone();
    let _a = subs.subscribe(move || {
        call!("a");
        subs2.subscribe(|| call!("late"));
    });
    subs.notify_all();
    cr.verify("a");
    assert_eq!(subs.len(), 2);
}

#[test]
fn panicking_callback_does_not_stop_the_cycle() {
    let mut cr = CallRecorder::new();
    let subs = Subscribers::new();
    let _a = subs.subscribe(|| call!("a"));
    let _b = subs.subscribe(|| panic!("boom"));
    let _c = subs.subscribe(|| call!("c"));
    subs.notify_all();
    cr.verify(["a", "c"]);
}

#[test]
fn reentrant_notification_skips_the_running_callback() {
    let mut cr = CallRecorder::new();
    let subs = Rc::new(Subscribers::new());
    let subs2 = subs.clone();
    let depth = Rc::new(Cell::new(0));
    let _a = subs.subscribe(move || {
        call!("a");
        if depth.get() == 0 {
            depth.set(1);
            subs2.notify_all();
        }
    });
    let _b = subs.subscribe(|| call!("b"));
    subs.notify_all();
    // The nested cycle runs `b` but skips the in-flight `a`.
    cr.verify(["a", "b", "b"]);
}

#[test]
fn clear_removes_everyone_but_keeps_the_id_sequence() {
    let subs = Subscribers::new();
    subs.subscribe(|| {});
    subs.subscribe(|| {});
    subs.clear();
    assert!(subs.is_empty());
    let c = subs.subscribe(|| {});
    assert_eq!(c.to_string(), "#3");
}

#[test]
fn subscription_guard_runs_on_drop() {
    let mut cr = CallRecorder::new();
    let s = Subscription::from_fn(|| call!("drop"));
    cr.verify(());
    drop(s);
    cr.verify("drop");
}

#[test]
fn empty_subscription_does_nothing() {
    drop(Subscription::empty());
}
