//! Observable stores.
//!
//! A [`Store<S>`] is a [`Property`] paired with a `Signal<()>`: every mutation
//! made through [`Store::update`] or [`Store::set`] notifies subscribers once,
//! after the write lock has been released. Readers take clones through
//! [`Store::snapshot`] or borrow through [`Store::with`].
//!
//! Stores are meant to be shared behind an `Arc` and passed explicitly to
//! whoever needs them; there is no global store.
//!
//! # Example
//!
//! ```
//! use anymodal_core::Store;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let store = Arc::new(Store::new(Vec::<u32>::new()));
//! let notified = Arc::new(AtomicUsize::new(0));
//!
//! let notified_clone = notified.clone();
//! let _guard = store.subscribe_scoped(move || {
//!     notified_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! store.update(|items| items.push(7));
//! assert_eq!(store.snapshot(), vec![7]);
//! assert_eq!(notified.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::logging::targets;
use crate::property::Property;
use crate::signal::{ConnectionGuard, ConnectionId, Signal};

/// A value with subscriber notification on mutation.
pub struct Store<S> {
    value: Property<S>,
    changed: Arc<Signal<()>>,
}

impl<S> Store<S> {
    /// Create a store holding `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            value: Property::new(initial),
            changed: Arc::new(Signal::new()),
        }
    }

    /// Borrow the current state through a closure.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        self.value.with(f)
    }

    /// Mutate the state and notify subscribers.
    ///
    /// Subscribers run after the write lock is released, so they may read
    /// from (or write to) this store.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut S) -> R,
    {
        let result = self.value.update(f);
        tracing::trace!(
            target: targets::STORE,
            subscribers = self.changed.connection_count(),
            "store updated"
        );
        self.changed.emit(());
        result
    }

    /// Replace the state and notify subscribers.
    pub fn set(&self, value: S) {
        self.update(|state| *state = value);
    }

    /// Subscribe to change notifications.
    pub fn subscribe<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.changed.connect(move |_| slot())
    }

    /// Subscribe for as long as the returned guard is alive.
    pub fn subscribe_scoped<F>(&self, slot: F) -> ConnectionGuard<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.changed.connect_scoped(move |_| slot())
    }

    /// Remove a subscription made with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.changed.disconnect(id)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changed.connection_count()
    }
}

impl<S: Clone> Store<S> {
    /// Clone the current state.
    pub fn snapshot(&self) -> S {
        self.value.get()
    }
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|state| {
            f.debug_struct("Store")
                .field("state", state)
                .field("subscribers", &self.subscriber_count())
                .finish()
        })
    }
}

static_assertions::assert_impl_all!(Store<Vec<String>>: Send, Sync);
