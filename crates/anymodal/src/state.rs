//! The shared modal state.

use std::fmt;
use std::sync::Arc;

use crate::modal::Modal;

/// The active modal and the back-stack behind it.
///
/// Descriptors are held by `Arc`: pushing and popping moves the same instance
/// around, never a copy, so instance identity can drive mounting decisions.
pub struct ModalState<M> {
    /// The overlay currently displayed.
    pub active_modal: Option<Arc<M>>,
    /// Previously active modals, oldest first.
    pub modal_stack: Vec<Arc<M>>,
}

impl<M> ModalState<M> {
    /// An empty state: nothing visible, no history.
    pub fn new() -> Self {
        Self {
            active_modal: None,
            modal_stack: Vec::new(),
        }
    }

    /// Whether an overlay is visible.
    pub fn is_open(&self) -> bool {
        self.active_modal.is_some()
    }

    /// Number of modals including the active one.
    pub fn depth(&self) -> usize {
        self.modal_stack.len() + usize::from(self.active_modal.is_some())
    }

    /// Whether `modal` is the active instance (by identity).
    pub fn is_active(&self, modal: &Arc<M>) -> bool {
        self.active_modal
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, modal))
    }
}

impl<M: Modal> ModalState<M> {
    /// Tag of the active modal.
    pub fn active_tag(&self) -> Option<&str> {
        self.active_modal.as_deref().map(Modal::tag)
    }

    /// Tags of the back-stack, oldest first.
    pub fn stack_tags(&self) -> Vec<&str> {
        self.modal_stack.iter().map(|m| m.tag()).collect()
    }
}

impl<M> Default for ModalState<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for ModalState<M> {
    fn clone(&self) -> Self {
        Self {
            active_modal: self.active_modal.clone(),
            modal_stack: self.modal_stack.clone(),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for ModalState<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalState")
            .field("active_modal", &self.active_modal)
            .field("modal_stack", &self.modal_stack)
            .finish()
    }
}

impl<M: PartialEq> PartialEq for ModalState<M> {
    fn eq(&self, other: &Self) -> bool {
        self.active_modal == other.active_modal && self.modal_stack == other.modal_stack
    }
}
