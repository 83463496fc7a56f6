//! Static action registration.
//!
//! Each action kind is listed once in a table with its display metadata
//! and constructor. Pipelines are rebuilt from persisted form by kind key.

use crate::action::Action;

/// Display metadata of an action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// Stable key written to persisted pipelines.
    pub kind: &'static str,
    pub display_name: &'static str,
    /// Label for the "add action" button.
    pub button_label: &'static str,
}

/// Registry row: metadata plus constructor for a context type.
pub struct ActionEntry<C: Send> {
    pub descriptor: &'static ActionDescriptor,
    pub create: fn() -> Box<dyn Action<C>>,
}

/// Looks up a registry row by kind key.
pub fn find_entry<'a, C: Send>(
    entries: &'a [ActionEntry<C>],
    kind: &str,
) -> Option<&'a ActionEntry<C>> {
    entries.iter().find(|e| e.descriptor.kind == kind)
}
