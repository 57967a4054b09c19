use std::{
    cell::RefCell,
    collections::BTreeMap,
    mem::take,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

use parse_display::Display;

#[cfg(test)]
mod tests;

/// Identifier of one registered subscriber. Ids start at 1, grow forever
/// and are never reused, even after the subscriber is removed.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("#{0}")]
pub struct SubscriberId(u64);

type Callback = Rc<RefCell<dyn FnMut()>>;

#[derive(Default)]
struct SubscriberData {
    last_id: u64,
    callbacks: BTreeMap<SubscriberId, Callback>,
}

/// Registry of change listeners.
#[derive(Default)]
pub struct Subscribers {
    data: RefCell<SubscriberData>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl FnMut() + 'static) -> SubscriberId {
        let mut data = self.data.borrow_mut();
        data.last_id += 1;
        let id = SubscriberId(data.last_id);
        data.callbacks.insert(id, Rc::new(RefCell::new(callback)));
        id
    }

    /// Removes a subscriber. Unknown or already removed ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.data.borrow_mut().callbacks.remove(&id);
    }

    /// Invokes every registered callback synchronously, in ascending id
    /// order.
    ///
    /// Iteration runs over a snapshot of the ids taken up front, so a
    /// callback may subscribe or unsubscribe freely: subscribers removed
    /// mid-cycle are skipped, subscribers added mid-cycle wait for the next
    /// cycle. A panicking callback is caught and logged without stopping
    /// the cycle, and a callback already running (re-entrant notification)
    /// is skipped.
    pub fn notify_all(&self) {
        let ids: Vec<SubscriberId> = self.data.borrow().callbacks.keys().copied().collect();
        for id in ids {
            let Some(callback) = self.data.borrow().callbacks.get(&id).cloned() else {
                continue;
            };
            let Ok(mut callback) = callback.try_borrow_mut() else {
                log::warn!("subscriber {id} notified re-entrantly, skipping");
                continue;
            };
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (*callback)())) {
                log::error!(
                    "subscriber {id} panicked during notification: {}",
                    panic_message(&payload)
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.data.borrow().callbacks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.borrow().callbacks.is_empty()
    }

    /// Removes every subscriber without resetting the id counter.
    pub fn clear(&self) {
        self.data.borrow_mut().callbacks.clear();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Owner of a registered interest; unsubscribes when dropped.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
}
