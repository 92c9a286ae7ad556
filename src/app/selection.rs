//! Selection accumulator
//!
//! Tracks, per classification role, the codes the user has toggled on.
//! Insertion order is toggle order and membership is by code value, so
//! toggling the same code twice restores the previous state.

use serde::{Deserialize, Serialize};

use crate::app::models::{CodeEntry, CodelistRole};

/// Codes chosen for each role of the active dataflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    chosen: [Vec<CodeEntry>; 3],
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `entry` from the role's selection if present (by value),
    /// otherwise append it; returns the updated selection for that role
    pub fn toggle(&mut self, role: CodelistRole, entry: CodeEntry) -> &[CodeEntry] {
        let chosen = &mut self.chosen[role.index()];
        match chosen.iter().position(|c| *c == entry) {
            Some(position) => {
                chosen.remove(position);
                tracing::debug!("Deselected {} {}", role, entry.value);
            }
            None => {
                tracing::debug!("Selected {} {}", role, entry.value);
                chosen.push(entry);
            }
        }
        chosen
    }

    /// Whether any indicator is selected; gates fetching
    pub fn is_indicator_non_empty(&self) -> bool {
        !self.get(CodelistRole::Indicator).is_empty()
    }

    pub fn get(&self, role: CodelistRole) -> &[CodeEntry] {
        &self.chosen[role.index()]
    }

    pub fn contains(&self, role: CodelistRole, entry: &CodeEntry) -> bool {
        self.get(role).contains(entry)
    }

    /// Selected code values for `role`, in toggle order
    pub fn values(&self, role: CodelistRole) -> Vec<String> {
        self.get(role).iter().map(|c| c.value.clone()).collect()
    }

    /// Selection rendered as "Description (value), ..."
    pub fn summary(&self, role: CodelistRole) -> String {
        self.get(role)
            .iter()
            .map(CodeEntry::label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn clear(&mut self) {
        self.chosen.iter_mut().for_each(Vec::clear);
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.iter().all(Vec::is_empty)
    }
}
