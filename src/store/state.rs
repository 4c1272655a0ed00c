use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::definition::FilterDefinitionSet;
use crate::types::{FilterId, Selection};

/// One selection per filter; no filter is ever missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    selections: BTreeMap<FilterId, Selection>,
}

impl SelectionState {
    /// Every filter at its default selection.
    pub fn defaults(definitions: &FilterDefinitionSet) -> Self {
        let selections = definitions
            .iter()
            .map(|def| (def.id.clone(), def.default_selection()))
            .collect();
        Self { selections }
    }

    pub fn get(&self, id: &str) -> Option<&Selection> {
        self.selections.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FilterId, &Selection)> {
        self.selections.iter()
    }

    /// Filters holding something other than their default.
    pub fn active(&self) -> impl Iterator<Item = (&FilterId, &Selection)> {
        self.selections.iter().filter(|(_, s)| !s.is_default())
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub(crate) fn apply(&mut self, batch: BTreeMap<FilterId, Selection>) {
        for (id, selection) in batch {
            self.selections.insert(id, selection);
        }
    }
}

/// The state as of one committed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    /// Incremented by one per committed batch.
    pub revision: u64,
    pub committed_at: DateTime<Utc>, // informational only
    pub selections: SelectionState,
}

impl SelectionSnapshot {
    pub fn get(&self, id: &str) -> Option<&Selection> {
        self.selections.get(id)
    }
}
