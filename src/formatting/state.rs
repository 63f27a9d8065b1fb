// src/formatting/state.rs
//! Immutable formatting state with pure transitions for markdown generation.

use crate::constants::INDENT_SPACES;

/// Nesting state threaded through the renderer.
///
/// Transitions return new values; a parent's context is never mutated by
/// rendering its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatContext {
    /// Current list nesting level
    indent_level: usize,
    /// Number of the current item in a run of numbered siblings
    list_number: usize,
}

impl FormatContext {
    /// Creates a new, empty formatting context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for the children of a list item: one level deeper, numbering
    /// restarted.
    pub fn enter_children(&self) -> Self {
        Self {
            indent_level: self.indent_level + 1,
            list_number: 0,
        }
    }

    /// Context for the next numbered sibling.
    pub fn increment_list_number(&self) -> Self {
        Self {
            list_number: self.list_number + 1,
            ..*self
        }
    }

    /// Ends a run of numbered siblings.
    pub fn exit_list(&self) -> Self {
        Self {
            list_number: 0,
            ..*self
        }
    }

    pub fn current_list_number(&self) -> usize {
        self.list_number
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    /// Leading whitespace for list markers at this level.
    pub fn indent(&self) -> String {
        " ".repeat(self.indent_level * INDENT_SPACES)
    }
}
