use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use slabmap::SlabMap;


/// Wall-clock time in milliseconds since the Unix epoch.
///
/// This is also the wire representation embedded in hydration payloads.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }
    pub const fn as_millis(self) -> u64 {
        self.0
    }
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_millis() as u64))
    }
}

/// Source of the current time. The store, ticker and timer queue share one
/// clock so tests can substitute [`ManualClock`] and drive simulated time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Timestamp(since_epoch.as_millis() as u64)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self(Rc::new(Cell::new(start.as_millis())))
    }
    pub fn set(&self, now: Timestamp) {
        self.0.set(now.as_millis());
    }
    pub fn advance(&self, duration: Duration) {
        self.0
            .set(self.0.get().saturating_add(duration.as_millis() as u64));
    }
}
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.get())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    deadline: Timestamp,
    seq: usize,
}

struct Entry {
    key: Key,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct TimerData {
    next_seqs: BTreeMap<Timestamp, usize>,
    tasks: BTreeMap<Key, usize>,
    entries: SlabMap<Entry>,
}

struct TimerQueue {
    clock: Rc<dyn Clock>,
    data: RefCell<TimerData>,
}

/// Cooperative single-threaded deadline queue.
///
/// Callbacks never run on their own; the host event loop calls
/// [`run_pending`](Self::run_pending) and may use
/// [`next_deadline`](Self::next_deadline) to decide how long to sleep.
#[derive(Clone)]
pub struct Timers(Rc<TimerQueue>);

impl Timers {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self(Rc::new(TimerQueue {
            clock,
            data: RefCell::new(TimerData::default()),
        }))
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.0.clock
    }

    /// Schedules `callback` to run once `after` has elapsed.
    ///
    /// Dropping the returned handle cancels the timer.
    pub fn schedule(&self, after: Duration, callback: impl FnOnce() + 'static) -> TimerHandle {
        self.schedule_at(self.0.clock.now().saturating_add(after), callback)
    }

    pub fn schedule_at(
        &self,
        deadline: Timestamp,
        callback: impl FnOnce() + 'static,
    ) -> TimerHandle {
        let mut data = self.0.data.borrow_mut();
        let next_seq = data.next_seqs.entry(deadline).or_insert(0);
        let key = Key {
            deadline,
            seq: *next_seq,
        };
        *next_seq += 1;
        let id = data.entries.insert(Entry {
            key,
            callback: Box::new(callback),
        });
        data.tasks.insert(key, id);
        TimerHandle {
            queue: self.0.clone(),
            id,
            key,
        }
    }

    /// Runs every callback whose deadline has been reached, in deadline
    /// order (insertion order within one deadline). Callbacks scheduled
    /// during this call with a later deadline are left for the next call.
    ///
    /// Returns `true` if any callback ran.
    pub fn run_pending(&self) -> bool {
        let now = self.0.clock.now();
        let mut handled = false;
        loop {
            let entry = {
                let mut data = self.0.data.borrow_mut();
                let Some((&key, _)) = data.tasks.first_key_value() else {
                    break;
                };
                if key.deadline > now {
                    break;
                }
                let id = data.tasks.remove(&key).unwrap();
                data.entries.remove(id).unwrap()
            };
            (entry.callback)();
            handled = true;
        }
        handled
    }

    /// The earliest pending deadline, if any timer is scheduled.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        let data = self.0.data.borrow();
        data.tasks.first_key_value().map(|(key, _)| key.deadline)
    }

    pub fn is_empty(&self) -> bool {
        self.0.data.borrow().tasks.is_empty()
    }
}

impl TimerQueue {
    fn cancel(&self, id: usize, key: Key) {
        let mut data = self.data.borrow_mut();
        // The slot may have been reused after the timer fired; only remove
        // an entry that still carries this handle's key.
        if data.entries.get(id).is_some_and(|e| e.key == key) {
            data.entries.remove(id);
            data.tasks.remove(&key);
        }
    }
}

/// Owner of a scheduled timer. Dropping it cancels the timer; cancelling
/// after the callback has run is a no-op.
#[must_use]
pub struct TimerHandle {
    queue: Rc<TimerQueue>,
    id: usize,
    key: Key,
}

impl TimerHandle {
    pub fn cancel(self) {}
}
impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.queue.cancel(self.id, self.key);
    }
}
