//! Ordered listener registry.
//!
//! Entries live behind an `Rc<Vec<_>>`. A notification pass clones the `Rc`
//! (the snapshot) and iterates it with no borrow held, so listeners may
//! subscribe or unsubscribe mid-pass. Mutation goes through
//! [`Rc::make_mut`], which copies the list only while a snapshot is alive.

use crate::metrics::StoreMetrics;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A state listener.
pub(crate) type Listener<S> = Rc<dyn Fn(&S)>;

/// Listeners in subscription order, paired with their registration ids.
pub(crate) type Snapshot<S> = Rc<Vec<(ListenerId, Listener<S>)>>;

/// Identity of one `subscribe` registration.
///
/// Subscribing the same closure twice yields two ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw id value, monotonically increasing per store
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

pub(crate) struct ListenerRegistry<S> {
    store: String,
    next_id: u64,
    entries: Snapshot<S>,
}

impl<S> ListenerRegistry<S> {
    pub(crate) fn new(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            next_id: 0,
            entries: Rc::new(Vec::new()),
        }
    }

    /// Append a listener and return its id.
    pub(crate) fn insert(&mut self, listener: Listener<S>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        Rc::make_mut(&mut self.entries).push((id, listener));
        StoreMetrics::record_listeners(&self.store, self.entries.len());
        id
    }

    /// Remove the registration with `id`. Returns `false` if it is already gone.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let Some(index) = self.entries.iter().position(|(entry, _)| *entry == id) else {
            return false;
        };
        Rc::make_mut(&mut self.entries).remove(index);
        StoreMetrics::record_listeners(&self.store, self.entries.len());
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn snapshot(&self) -> Snapshot<S> {
        Rc::clone(&self.entries)
    }
}

/// Handle returned by [`Store::subscribe`](crate::Store::subscribe).
///
/// Calling [`unsubscribe`](Self::unsubscribe) removes exactly the registration
/// that produced this handle. Dropping the handle does not unsubscribe.
pub struct Unsubscribe<S> {
    id: ListenerId,
    registry: Weak<RefCell<ListenerRegistry<S>>>,
}

impl<S> Unsubscribe<S> {
    pub(crate) const fn new(id: ListenerId, registry: Weak<RefCell<ListenerRegistry<S>>>) -> Self {
        Self { id, registry }
    }

    /// The registration this handle removes
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener.
    ///
    /// Returns `true` the first time, `false` on every later call or once the
    /// store is gone. Safe to call from inside a listener; a listener removed
    /// mid-notification still runs for the dispatch in progress.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.borrow_mut().remove(self.id);
        if removed {
            tracing::debug!(listener_id = self.id.get(), "Listener unsubscribed");
        } else {
            tracing::trace!(listener_id = self.id.get(), "Listener already unsubscribed");
        }
        removed
    }
}

impl<S> fmt::Debug for Unsubscribe<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("id", &self.id)
            .field("store_alive", &(self.registry.strong_count() > 0))
            .finish()
    }
}
