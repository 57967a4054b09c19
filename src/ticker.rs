use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
    time::Duration,
};

use crate::{
    store::{StateChange, Store},
    timer::{TimerHandle, Timers},
};


pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

struct TickerNode {
    timers: Timers,
    store: Store,
    interval: Duration,
    pending: RefCell<Option<TimerHandle>>,
    stopped: Cell<bool>,
}

impl TickerNode {
    fn arm(node: &Rc<Self>) {
        if node.stopped.get() {
            return;
        }
        let weak = Rc::downgrade(node);
        let handle = node.timers.schedule(node.interval, move || Self::tick(&weak));
        *node.pending.borrow_mut() = Some(handle);
    }

    fn tick(weak: &Weak<Self>) {
        let Some(node) = weak.upgrade() else {
            return;
        };
        // Re-arm first: a subscriber that stops the ticker during the
        // notification below must cancel the next tick, not a stale one.
        Self::arm(&node);
        let now = node.timers.clock().now();
        log::trace!("clock tick at {}ms", now.as_millis());
        node.store.apply(StateChange::SetTimestamp(now));
    }
}

/// Recurring timer that refreshes the store's timestamp.
///
/// Every tick goes through the full notification cycle; views that do not
/// display the time are expected to suppress their own update (see
/// [`Store::watch`]).
pub struct ClockTicker(Rc<TickerNode>);

impl ClockTicker {
    /// Starts ticking every `interval`, beginning one interval from now.
    ///
    /// The ticker stops when [`stop`](Self::stop) is called or when it is
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn start(timers: &Timers, store: &Store, interval: Duration) -> Self {
        assert!(interval > Duration::ZERO, "tick interval must be nonzero");
        let node = Rc::new(TickerNode {
            timers: timers.clone(),
            store: store.clone(),
            interval,
            pending: RefCell::new(None),
            stopped: Cell::new(false),
        });
        TickerNode::arm(&node);
        ClockTicker(node)
    }

    /// Cancels the recurring timer. Idempotent; a stopped ticker cannot be
    /// restarted.
    pub fn stop(&self) {
        self.0.stopped.set(true);
        self.0.pending.borrow_mut().take();
    }

    pub fn is_running(&self) -> bool {
        !self.0.stopped.get()
    }
}
