use std::fmt;
use std::sync::Arc;

use crate::provider::OptionProvider;
use crate::types::{FilterId, FilterOption, Selection};

/// Static description of one filter. Immutable once it joins a
/// [`FilterDefinitionSet`](super::FilterDefinitionSet).
#[derive(Clone)]
pub struct FilterDefinition {
    pub id: FilterId,
    pub label: String,
    pub depends_on: Vec<FilterId>,
    pub is_multi: bool,
    pub default_value: FilterOption,
    pub provider: Arc<dyn OptionProvider>,
}

impl FilterDefinition {
    /// A single-select root filter labelled by its id, defaulting to "All".
    pub fn new(id: impl Into<FilterId>, provider: impl OptionProvider + 'static) -> Self {
        Self::with_shared_provider(id, Arc::new(provider))
    }

    pub fn with_shared_provider(id: impl Into<FilterId>, provider: Arc<dyn OptionProvider>) -> Self {
        let id = id.into();
        Self {
            label: id.as_str().to_string(),
            id,
            depends_on: Vec::new(),
            is_multi: false,
            default_value: FilterOption::all(),
            provider,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn depends_on<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FilterId>,
    {
        self.depends_on = ancestors.into_iter().map(Into::into).collect();
        self
    }

    pub fn multi(mut self) -> Self {
        self.is_multi = true;
        self
    }

    pub fn default_value(mut self, option: FilterOption) -> Self {
        self.default_value = option;
        self
    }

    pub fn default_selection(&self) -> Selection {
        Selection::default_for(self.is_multi, &self.default_value)
    }

    /// Coerces a caller-supplied selection into this filter's shape.
    pub fn normalize(&self, selection: Selection) -> Selection {
        selection.normalized_for(self.is_multi, &self.default_value)
    }
}

impl fmt::Debug for FilterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDefinition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("depends_on", &self.depends_on)
            .field("is_multi", &self.is_multi)
            .field("default_value", &self.default_value)
            .finish_non_exhaustive()
    }
}
