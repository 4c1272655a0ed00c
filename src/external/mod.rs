//! Flat, string-keyed form of the selections, as kept in URL query strings.
//!
//! `country=10&store=3,4` maps each filter to one raw id or a comma-separated
//! list of raw ids. The default sentinel is never written; a filter missing
//! from the state means "default".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::SelectionState;
use crate::types::{FilterId, OptionId, StateFingerprint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalStateError {
    #[error("Invalid option id {raw:?} for filter {filter}")]
    InvalidOptionId { filter: FilterId, raw: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalState {
    values: BTreeMap<FilterId, Vec<String>>,
}

impl ExternalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without the leading `?`. Unknown keys
    /// are kept; the engine ignores them.
    pub fn parse_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            state.insert(key.into_owned(), value.split(','));
        }
        state
    }

    /// Canonical query string: keys in lexicographic order, values in
    /// selection order.
    pub fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (id, raw) in &self.values {
            serializer.append_pair(id.as_str(), &raw.join(","));
        }
        serializer.finish()
    }

    /// Encodes every filter not at its default.
    pub fn from_state(state: &SelectionState) -> Self {
        let mut external = Self::new();
        for (id, selection) in state.active() {
            external.insert(
                id.clone(),
                selection
                    .ids()
                    .filter(|option| !option.is_default())
                    .map(|option| option.to_string()),
            );
        }
        external
    }

    /// Replaces the raw ids of `id`. Blank entries and the default sentinel
    /// are dropped; if nothing is left the filter is removed.
    pub fn insert<I, S>(&mut self, id: impl Into<FilterId>, raw: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = id.into();
        let raw: Vec<String> = raw
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty() && s.parse::<OptionId>().map_or(true, |o| !o.is_default()))
            .collect();

        if raw.is_empty() {
            self.values.remove(&id);
        } else {
            self.values.insert(id, raw);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Vec<String>> {
        self.values.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.values.get(id).map(Vec::as_slice)
    }

    /// Raw ids of `id` parsed one by one, so a single malformed entry does not
    /// hide the others.
    pub fn option_ids<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = Result<OptionId, ExternalStateError>> + 'a {
        self.get(id).unwrap_or_default().iter().map(move |raw| {
            raw.parse::<OptionId>()
                .map_err(|_| ExternalStateError::InvalidOptionId {
                    filter: FilterId::new(id),
                    raw: raw.clone(),
                })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FilterId, &[String])> {
        self.values.iter().map(|(id, raw)| (id, raw.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Content hash of the canonical query string; equal states share a
    /// fingerprint, so a sync layer can skip redundant writes.
    pub fn fingerprint(&self) -> StateFingerprint {
        StateFingerprint::from_content(self.to_query().as_bytes())
    }
}
