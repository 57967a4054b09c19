use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use serde::Serialize;

use crate::{
    data::{ArticleMap, Author, AuthorMap, DataError, RawData},
    subscription::{SubscriberId, Subscribers, Subscription},
    timer::{Clock, SystemClock, Timestamp},
};


/// One immutable snapshot of everything the UI reads.
///
/// Snapshots are replaced wholesale on every mutation and shared as
/// `Rc<StoreState>`; nothing ever writes through one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub articles: ArticleMap,
    pub authors: AuthorMap,
    pub search_term: String,
    pub timestamp: Timestamp,
    /// Strictly increasing across snapshots of one store. Subscribers never
    /// observe a version going backwards.
    pub version: u64,
}

impl StoreState {
    /// Serialization of the snapshot for embedding in server-rendered
    /// markup.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A single typed mutation, applied by total match in
/// [`Store::apply_all`].
#[derive(Clone, Debug)]
pub enum StateChange {
    SetSearchTerm(String),
    SetTimestamp(Timestamp),
    SetArticles(ArticleMap),
    SetAuthors(AuthorMap),
}

struct StoreNode {
    state: RefCell<Rc<StoreState>>,
    subscribers: Subscribers,
}

/// Publish/subscribe store holding the application state.
///
/// `Store` is a cheap `Rc` handle; clone it into every component that needs
/// access instead of reaching for a global.
#[derive(Clone)]
pub struct Store(Rc<StoreNode>);

impl Store {
    /// Builds the first snapshot from a wire payload, with an empty search
    /// term and the clock's current time.
    pub fn initialize(raw: RawData) -> Result<Self, DataError> {
        Self::initialize_with_clock(raw, &SystemClock)
    }

    pub fn initialize_with_clock(raw: RawData, clock: &dyn Clock) -> Result<Self, DataError> {
        let (articles, authors) = raw.index()?;
        let state = StoreState {
            articles,
            authors,
            search_term: String::new(),
            timestamp: clock.now(),
            version: 0,
        };
        Ok(Self(Rc::new(StoreNode {
            state: RefCell::new(Rc::new(state)),
            subscribers: Subscribers::new(),
        })))
    }

    /// The current snapshot.
    pub fn state(&self) -> Rc<StoreState> {
        self.0.state.borrow().clone()
    }

    pub fn apply(&self, change: StateChange) {
        self.apply_all([change]);
    }

    /// Replaces the current snapshot with one that has every change
    /// applied, then synchronously notifies all subscribers in ascending id
    /// order. An empty change set still produces a fresh snapshot (with a
    /// bumped version) and still notifies.
    pub fn apply_all(&self, changes: impl IntoIterator<Item = StateChange>) {
        {
            let mut current = self.0.state.borrow_mut();
            let mut next = (**current).clone();
            for change in changes {
                match change {
                    StateChange::SetSearchTerm(term) => next.search_term = term,
                    StateChange::SetTimestamp(timestamp) => next.timestamp = timestamp,
                    StateChange::SetArticles(articles) => next.articles = articles,
                    StateChange::SetAuthors(authors) => next.authors = authors,
                }
            }
            next.version = current.version + 1;
            *current = Rc::new(next);
        }
        // The new snapshot is in place before any subscriber runs.
        self.0.subscribers.notify_all();
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.apply(StateChange::SetSearchTerm(term.into()));
    }

    /// Point lookup against the current snapshot. Absence is `None`, never
    /// an error.
    pub fn lookup_author(&self, id: &str) -> Option<Author> {
        self.state().authors.get(id).cloned()
    }

    pub fn subscribe(&self, callback: impl FnMut() + 'static) -> SubscriberId {
        self.0.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.0.subscribers.unsubscribe(id);
    }

    /// Like [`subscribe`](Self::subscribe), but returns a guard that
    /// unsubscribes when dropped.
    pub fn subscribe_scoped(&self, callback: impl FnMut() + 'static) -> Subscription {
        let id = self.subscribe(callback);
        let store = self.clone();
        Subscription::from_fn(move || store.unsubscribe(id))
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.len()
    }

    /// Subscribes a view to part of the state.
    ///
    /// `selector` runs against every new snapshot; `on_change` runs only
    /// when the selected value differs from the previously selected one, so
    /// a view that depends on one field is not re-rendered by unrelated
    /// mutations such as clock ticks.
    pub fn watch<T, S, F>(&self, mut selector: S, mut on_change: F) -> Subscription
    where
        T: PartialEq + 'static,
        S: FnMut(&StoreState) -> T + 'static,
        F: FnMut(&T) + 'static,
    {
        let weak: Weak<StoreNode> = Rc::downgrade(&self.0);
        let mut last = selector(&self.state());
        self.subscribe_scoped(move || {
            let Some(node) = weak.upgrade() else {
                return;
            };
            let state = node.state.borrow().clone();
            let next = selector(&state);
            if next != last {
                on_change(&next);
                last = next;
            }
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.state.try_borrow() {
            Ok(state) => std::fmt::Debug::fmt(&**state, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
