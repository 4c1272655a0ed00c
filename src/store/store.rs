// Holds state only:
// no validation
// every write is a whole-snapshot swap

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use super::state::{SelectionSnapshot, SelectionState};
use crate::definition::FilterDefinitionSet;
use crate::types::{FilterId, Selection};

/// Receiver that yields after every committed batch.
///
/// Dropping it unsubscribes. A slow subscriber that misses intermediate
/// revisions still only ever observes complete snapshots.
pub type StateWatcher = watch::Receiver<Arc<SelectionSnapshot>>;

/// The single shared mutable resource of an engine.
///
/// Readers borrow an immutable [`SelectionSnapshot`]; writers replace it in one
/// step, so a batch is visible either entirely or not at all.
#[derive(Debug)]
pub struct SelectionStore {
    sender: watch::Sender<Arc<SelectionSnapshot>>,
    defaults: SelectionState,
}

impl SelectionStore {
    pub fn new(definitions: &FilterDefinitionSet) -> Self {
        let defaults = SelectionState::defaults(definitions);
        let initial = SelectionSnapshot {
            revision: 0,
            committed_at: Utc::now(),
            selections: defaults.clone(),
        };
        let (sender, _) = watch::channel(Arc::new(initial));
        Self { sender, defaults }
    }

    pub fn get(&self, id: &str) -> Option<Selection> {
        self.sender.borrow().get(id).cloned()
    }

    pub fn snapshot(&self) -> Arc<SelectionSnapshot> {
        Arc::clone(&self.sender.borrow())
    }

    /// Writes one selection as a batch of one. Returns the new revision.
    pub fn set(&self, id: FilterId, selection: Selection) -> u64 {
        self.commit_batch(BTreeMap::from([(id, selection)]))
    }

    /// Applies every entry of `batch` as a single transition and notifies
    /// subscribers once. Returns the new revision.
    pub fn commit_batch(&self, batch: BTreeMap<FilterId, Selection>) -> u64 {
        let mut revision = 0;
        self.sender.send_modify(|current| {
            let mut next = SelectionSnapshot::clone(current);
            next.selections.apply(batch);
            next.revision += 1;
            next.committed_at = Utc::now();
            revision = next.revision;
            *current = Arc::new(next);
        });
        revision
    }

    /// Restores every filter to its default. Returns the new revision.
    pub fn reset(&self) -> u64 {
        let defaults: BTreeMap<FilterId, Selection> = self
            .defaults
            .iter()
            .map(|(id, selection)| (id.clone(), selection.clone()))
            .collect();
        self.commit_batch(defaults)
    }

    pub fn subscribe(&self) -> StateWatcher {
        self.sender.subscribe()
    }
}
