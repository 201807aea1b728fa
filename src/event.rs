//! Synchronous observer lists for change notification.
//!
//! An [`Event`] is a cloneable handle to a shared subscriber list.
//! Cloning the handle shares the list, so a property split across
//! intervals keeps notifying the same subscribers. Raising an event
//! invokes every subscriber synchronously, in subscription order.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifies one subscription so it can be removed later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Listener<T>)>,
}

/// A synchronous, in-process notification channel.
pub struct Event<T = ()> {
    inner: Arc<Mutex<Listeners<T>>>,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Register a listener; returns an id for [`unsubscribe`].
    ///
    /// [`unsubscribe`]: Event::unsubscribe
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }

    /// Invoke every listener with `args`, in subscription order.
    ///
    /// The subscriber list is snapshotted before invocation, so a
    /// listener may subscribe or unsubscribe freely while the event is
    /// being raised.
    pub fn raise(&self, args: &T) {
        let snapshot: Vec<Listener<T>> = {
            let inner = self.inner.lock();
            inner.subscribers.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in snapshot {
            listener(args);
        }
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({} subscribers)", self.subscriber_count())
    }
}
