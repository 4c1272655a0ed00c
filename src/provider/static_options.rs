use async_trait::async_trait;

use super::{AncestorSelections, OptionProvider, ProviderError};
use crate::types::FilterOption;

/// Serves a fixed option list, narrowed by ancestor selections.
///
/// An option survives an ancestor `country` when its `country_id` attribute is
/// one of the selected country ids. Ancestors left at the default sentinel do
/// not constrain anything, and options lacking the attribute are dropped
/// whenever that ancestor is constrained.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    options: Vec<FilterOption>,
}

impl StaticProvider {
    pub fn new(options: Vec<FilterOption>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    /// Synchronous core of [`OptionProvider::fetch`].
    pub fn filter(&self, ancestors: &AncestorSelections) -> Vec<FilterOption> {
        let constraints: Vec<_> = ancestors
            .iter()
            .filter_map(|(ancestor, _)| {
                ancestors
                    .constraint(ancestor.as_str())
                    .map(|ids| (ancestor.as_str(), ids))
            })
            .collect();

        self.options
            .iter()
            .filter(|option| !option.is_default())
            .filter(|option| {
                constraints.iter().all(|(ancestor, ids)| {
                    option
                        .attributes
                        .link(ancestor)
                        .is_some_and(|id| ids.contains(&id))
                })
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OptionProvider for StaticProvider {
    async fn fetch(&self, ancestors: &AncestorSelections) -> Result<Vec<FilterOption>, ProviderError> {
        Ok(self.filter(ancestors))
    }
}
