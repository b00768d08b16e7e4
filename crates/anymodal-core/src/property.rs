//! Property system for anymodal.
//!
//! A [`Property<T>`] is a lock-guarded value cell. It carries no
//! notification of its own; pair it with a [`Signal`](crate::Signal), or use
//! [`Store`](crate::Store) which does the pairing for you.
//!
//! # Example
//!
//! ```
//! use anymodal_core::{Property, Signal};
//!
//! struct Counter {
//!     value: Property<i32>,
//!     value_changed: Signal<i32>,
//! }
//!
//! impl Counter {
//!     fn increment(&self) {
//!         let new_value = self.value.update(|value| {
//!             *value += 1;
//!             *value
//!         });
//!         self.value_changed.emit(new_value);
//!     }
//! }
//!
//! let counter = Counter { value: Property::new(0), value_changed: Signal::new() };
//! counter.increment();
//! assert_eq!(counter.value.get(), 1);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A lock-guarded value cell.
///
/// Reads borrow through [`with`](Self::with) or clone through
/// [`get`](Self::get); writes go through [`update`](Self::update).
///
/// # Thread Safety
///
/// `Property<T>` uses interior mutability with `RwLock` and is `Send + Sync`
/// whenever `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Mutate the value in place under the write lock.
    ///
    /// The lock is held only for the duration of `f`; callers that notify
    /// observers must do so after this returns.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.value.write())
    }
}

impl<T: Clone> Property<T> {
    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| f.debug_struct("Property").field("value", value).finish())
    }
}
