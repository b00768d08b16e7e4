//! Human-readable dumps of the modal stack.
//!
//! ```
//! use anymodal::debug::format_stack;
//! use anymodal::{Modal, ModalStack};
//!
//! struct Named(&'static str);
//! impl Modal for Named {
//!     fn tag(&self) -> &str { self.0 }
//! }
//!
//! let stack = ModalStack::new();
//! stack.show(Named("profile"));
//! stack.show(Named("settings"));
//!
//! assert_eq!(
//!     format_stack(&stack.state()),
//!     "Modal Stack (2 total):\n\u{251c}\u{2500}\u{2500} profile\n\u{2514}\u{2500}\u{2500} settings (active)\n"
//! );
//! ```

use std::fmt::Write;

use crate::modal::Modal;
use crate::state::ModalState;

const BRANCH: &str = "\u{251c}\u{2500}\u{2500}";
const LAST_BRANCH: &str = "\u{2514}\u{2500}\u{2500}";

/// Format `state` as a tree, oldest first, active modal last.
pub fn format_stack<M: Modal>(state: &ModalState<M>) -> String {
    let entries: Vec<(&str, bool)> = state
        .modal_stack
        .iter()
        .map(|modal| (modal.tag(), false))
        .chain(state.active_modal.iter().map(|modal| (modal.tag(), true)))
        .collect();

    let mut output = String::new();
    let _ = writeln!(output, "Modal Stack ({} total):", entries.len());
    if entries.is_empty() {
        output.push_str("  (empty)\n");
        return output;
    }

    let last = entries.len() - 1;
    for (position, (tag, active)) in entries.into_iter().enumerate() {
        let connector = if position == last { LAST_BRANCH } else { BRANCH };
        let tag = if tag.is_empty() { "(untagged)" } else { tag };
        let marker = if active { " (active)" } else { "" };
        let _ = writeln!(output, "{connector} {tag}{marker}");
    }
    output
}
