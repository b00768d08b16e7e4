//! Modal stack controller.
//!
//! [`ModalStack`] is the only writer of a [`ModalState`] store. Each operation
//! is one atomic store mutation followed by a single change notification.
//!
//! # Invariants
//!
//! - `show` pushes the previously active modal (if any) before installing the
//!   new one, so chains of modals can be walked back one step at a time.
//! - `go_back` on an empty stack clears the active slot and never fails.
//! - `close_all` empties both the stack and the active slot.

use std::sync::Arc;

use anymodal_core::logging::targets;
use anymodal_core::Store;

use crate::modal::Modal;
use crate::state::ModalState;

/// Controller over a shared modal state store.
pub struct ModalStack<M> {
    store: Arc<Store<ModalState<M>>>,
}

impl<M: Modal> ModalStack<M> {
    /// Create a controller with a fresh, empty store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::new(ModalState::new())))
    }

    /// Create a controller over an existing store.
    pub fn with_store(store: Arc<Store<ModalState<M>>>) -> Self {
        Self { store }
    }

    /// The underlying store, for subscriptions and snapshots.
    pub fn store(&self) -> &Arc<Store<ModalState<M>>> {
        &self.store
    }

    /// Display `modal`, pushing the current one onto the back-stack.
    pub fn show(&self, modal: M) -> Arc<M> {
        let modal = Arc::new(modal);
        self.show_arc(modal.clone());
        modal
    }

    /// Display an already shared descriptor, keeping its identity.
    pub fn show_arc(&self, modal: Arc<M>) {
        let tag = modal.tag().to_owned();
        let depth = self.store.update(move |state| {
            if let Some(previous) = state.active_modal.take() {
                state.modal_stack.push(previous);
            }
            state.active_modal = Some(modal);
            state.depth()
        });
        tracing::debug!(target: targets::STACK, %tag, depth, "modal shown");
    }

    /// Return to the previous modal, or close if there is none.
    pub fn go_back(&self) {
        let (tag, depth) = self.store.update(|state| {
            state.active_modal = state.modal_stack.pop();
            (state.active_tag().map(str::to_owned), state.depth())
        });
        tracing::debug!(target: targets::STACK, tag = ?tag, depth, "went back");
    }

    /// Dismiss the active modal and the whole back-stack.
    pub fn close_all(&self) {
        let dismissed = self.store.update(|state| {
            let dismissed = state.depth();
            state.modal_stack.clear();
            state.active_modal = None;
            dismissed
        });
        tracing::debug!(target: targets::STACK, dismissed, "closed all modals");
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ModalState<M> {
        self.store.snapshot()
    }
}

impl<M: Modal> Default for ModalStack<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for ModalStack<M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Named(&'static str);

    impl Modal for Named {
        fn tag(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_show_pushes_previous() {
        let stack = ModalStack::new();
        let a = stack.show(Named("a"));
        let b = stack.show(Named("b"));

        let state = stack.state();
        assert!(state.is_active(&b));
        assert_eq!(state.modal_stack.len(), 1);
        assert!(Arc::ptr_eq(&state.modal_stack[0], &a));
    }

    #[test]
    fn test_go_back_restores_previous() {
        let stack = ModalStack::new();
        let a = stack.show(Named("a"));
        stack.show(Named("b"));

        stack.go_back();

        let state = stack.state();
        assert!(state.is_active(&a));
        assert!(state.modal_stack.is_empty());
    }

    #[test]
    fn test_go_back_on_empty_is_noop() {
        let stack = ModalStack::<Named>::new();
        stack.go_back();

        let state = stack.state();
        assert!(state.active_modal.is_none());
        assert!(state.modal_stack.is_empty());
    }

    #[test]
    fn test_go_back_from_last_closes() {
        let stack = ModalStack::new();
        stack.show(Named("a"));
        stack.go_back();
        assert!(!stack.state().is_open());
    }

    #[test]
    fn test_close_all_clears_any_depth() {
        let stack = ModalStack::new();
        for tag in ["a", "b", "c", "a"] {
            stack.show(Named(tag));
        }
        assert_eq!(stack.state().depth(), 4);

        stack.close_all();

        let state = stack.state();
        assert!(state.active_modal.is_none());
        assert!(state.modal_stack.is_empty());
    }

    #[test]
    fn test_repeated_show_of_same_tag() {
        let stack = ModalStack::new();
        stack.show(Named("a"));
        stack.show(Named("a"));
        stack.show(Named("a"));

        let state = stack.state();
        assert_eq!(state.stack_tags(), vec!["a", "a"]);
        assert_eq!(state.active_tag(), Some("a"));
    }

    #[test]
    fn test_show_arc_keeps_identity() {
        let stack = ModalStack::new();
        let shared = Arc::new(Named("shared"));
        stack.show_arc(shared.clone());
        stack.show(Named("other"));
        stack.go_back();
        assert!(stack.state().is_active(&shared));
    }

    #[test]
    fn test_each_operation_notifies_once() {
        let stack = ModalStack::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        stack.store().subscribe(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        stack.show(Named("a"));
        stack.go_back();
        stack.go_back();
        stack.close_all();

        assert_eq!(count.load(Ordering::SeqCst), 4);
    }
}
