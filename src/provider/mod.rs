//! Option providers: the pluggable data source behind every filter.

pub mod function;
pub mod static_options;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{FilterId, FilterOption, OptionId};

pub use function::{provider_fn, FnProvider};
pub use static_options::StaticProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Option fetch failed: {0}")]
    Failed(String),
    #[error("Option source unavailable")]
    Unavailable,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// One entry per ancestor, in `depends_on` order. Each entry is a collection
/// because an ancestor may be multi-select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorSelections {
    entries: Vec<(FilterId, Vec<FilterOption>)>,
}

impl AncestorSelections {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, ancestor: FilterId, options: Vec<FilterOption>) {
        self.entries.push((ancestor, options));
    }

    pub fn get(&self, ancestor: &str) -> Option<&[FilterOption]> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == ancestor)
            .map(|(_, options)| options.as_slice())
    }

    /// Selected ids of `ancestor`, or `None` when the ancestor is unconstrained
    /// (absent, or its selection contains the default sentinel).
    pub fn constraint(&self, ancestor: &str) -> Option<Vec<OptionId>> {
        let options = self.get(ancestor)?;
        if options.is_empty() || options.iter().any(FilterOption::is_default) {
            return None;
        }
        Some(options.iter().map(|o| o.id).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FilterId, &[FilterOption])> {
        self.entries
            .iter()
            .map(|(id, options)| (id, options.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches the valid options of one filter under a given ancestor context.
///
/// Implementations return real options only; the engine adds the default
/// sentinel where a caller needs it. Errors are recovered by the engine and
/// never abort a reconciliation pass. The engine enforces no timeout, so a
/// provider that talks to the network should bound its own calls.
#[async_trait]
pub trait OptionProvider: Send + Sync {
    async fn fetch(&self, ancestors: &AncestorSelections) -> Result<Vec<FilterOption>, ProviderError>;
}
