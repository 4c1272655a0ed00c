use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::definition::FilterDefinitionSet;
use crate::types::FilterId;

/// Loading state of a filter's options, for UI collaborators.
///
/// Purely informational: selection correctness never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready { options: usize },
    Failed { error: String },
}

pub type StatusWatcher = watch::Receiver<BTreeMap<FilterId, FetchStatus>>;

#[derive(Debug)]
pub struct StatusBoard {
    sender: watch::Sender<BTreeMap<FilterId, FetchStatus>>,
}

impl StatusBoard {
    pub fn new(definitions: &FilterDefinitionSet) -> Self {
        let initial = definitions
            .iter()
            .map(|def| (def.id.clone(), FetchStatus::Idle))
            .collect();
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn set(&self, id: &FilterId, status: FetchStatus) {
        self.sender.send_if_modified(|statuses| {
            if statuses.get(id) == Some(&status) {
                return false;
            }
            statuses.insert(id.clone(), status);
            true
        });
    }

    pub fn get(&self, id: &str) -> Option<FetchStatus> {
        self.sender.borrow().get(id).cloned()
    }

    pub fn subscribe(&self) -> StatusWatcher {
        self.sender.subscribe()
    }
}
