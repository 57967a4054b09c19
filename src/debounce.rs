use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    time::Duration,
};

use crate::timer::{TimerHandle, Timers};


pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

struct Pending<T> {
    value: Option<T>,
    handle: Option<TimerHandle>,
}

struct DebounceNode<T> {
    timers: Timers,
    quiet: Duration,
    action: RefCell<Box<dyn FnMut(T)>>,
    pending: RefCell<Pending<T>>,
}

impl<T: 'static> DebounceNode<T> {
    fn fire(weak: &Weak<Self>) {
        let Some(node) = weak.upgrade() else {
            return;
        };
        let value = {
            let mut pending = node.pending.borrow_mut();
            pending.handle = None;
            pending.value.take()
        };
        if let Some(value) = value {
            (*node.action.borrow_mut())(value);
        }
    }
}

/// Coalesces rapid repeated calls into one action after a quiet period.
///
/// Each [`call`](Self::call) replaces the pending value and restarts the
/// deadline; once no call has arrived for the quiet period, the action runs
/// with the latest value.
///
/// Cancellation contract: [`cancel`](Self::cancel) discards the pending
/// call, dropping the debouncer cancels too, and [`flush`](Self::flush)
/// runs a pending call immediately instead of waiting out the quiet period.
pub struct Debouncer<T: 'static>(Rc<DebounceNode<T>>);

impl<T: 'static> Debouncer<T> {
    pub fn new(timers: &Timers, quiet: Duration, action: impl FnMut(T) + 'static) -> Self {
        Self(Rc::new(DebounceNode {
            timers: timers.clone(),
            quiet,
            action: RefCell::new(Box::new(action)),
            pending: RefCell::new(Pending {
                value: None,
                handle: None,
            }),
        }))
    }

    pub fn call(&self, value: T) {
        let weak = Rc::downgrade(&self.0);
        let mut pending = self.0.pending.borrow_mut();
        pending.value = Some(value);
        // Replacing the handle cancels the previous deadline.
        pending.handle = Some(
            self.0
                .timers
                .schedule(self.0.quiet, move || DebounceNode::fire(&weak)),
        );
    }

    /// Discards the pending call, if any.
    pub fn cancel(&self) {
        let mut pending = self.0.pending.borrow_mut();
        pending.value = None;
        pending.handle = None;
    }

    /// Runs the pending call now instead of waiting out the quiet period.
    /// No-op when nothing is pending.
    pub fn flush(&self) {
        let value = {
            let mut pending = self.0.pending.borrow_mut();
            pending.handle = None;
            pending.value.take()
        };
        if let Some(value) = value {
            (*self.0.action.borrow_mut())(value);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.pending.borrow().value.is_some()
    }
}
