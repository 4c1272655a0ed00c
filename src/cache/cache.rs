// Advisory only:
// nothing is evicted
// a miss is always safe
// failed fetches are never stored

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::key::OptionsKey;
use crate::types::FilterOption;

#[derive(Debug, Default)]
pub struct OptionsCache {
    entries: Mutex<HashMap<OptionsKey, Arc<[FilterOption]>>>,
}

impl OptionsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &OptionsKey) -> Option<Arc<[FilterOption]>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: OptionsKey, options: Arc<[FilterOption]>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, options);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
