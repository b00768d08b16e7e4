//! Core systems for anymodal.
//!
//! This crate provides the reactive and async foundations the modal system is
//! built on:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Property System**: Value cells with change detection
//! - **Observable Store**: A property and a signal bundled together, with
//!   snapshot reads and scoped subscriptions
//! - **Async Runtime**: Tokio runtime ownership, task handles and
//!   cancellation tokens used as mount guards
//!
//! # Store Example
//!
//! ```
//! use anymodal_core::Store;
//! use std::sync::Arc;
//!
//! let store = Arc::new(Store::new(0_u32));
//! let id = store.subscribe(|| println!("changed"));
//!
//! store.update(|n| *n += 1);
//! assert_eq!(store.snapshot(), 1);
//!
//! store.unsubscribe(id);
//! ```
//!
//! # Signal Example
//!
//! ```
//! use anymodal_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod async_runtime;
pub mod logging;
pub mod property;
pub mod signal;
pub mod store;

pub use async_runtime::{
    spawn_on, AsyncCancellationToken, AsyncRuntime, AsyncRuntimeConfig, AsyncRuntimeError,
    AsyncTaskHandle,
};
pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use store::Store;
