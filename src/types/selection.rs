use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::identifiers::OptionId;
use super::option::FilterOption;

/// The current value of one filter.
///
/// Multi selections are never empty: once every user-chosen option is gone
/// they fall back to `[default]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Single(FilterOption),
    Multi(Vec<FilterOption>),
}

impl Selection {
    pub fn single(option: FilterOption) -> Self {
        Selection::Single(option)
    }

    /// Builds a multi selection, falling back to `[default]` when `options`
    /// is empty.
    pub fn multi(options: impl IntoIterator<Item = FilterOption>, default: &FilterOption) -> Self {
        Selection::Multi(options.into_iter().collect()).normalized_for(true, default)
    }

    /// The resting value of a filter: its default option, wrapped in a
    /// one-element collection for multi filters.
    pub fn default_for(is_multi: bool, default: &FilterOption) -> Self {
        if is_multi {
            Selection::Multi(vec![default.clone()])
        } else {
            Selection::Single(default.clone())
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Selection::Multi(_))
    }

    /// Every selection viewed as a collection; a single selection is a
    /// one-element slice.
    pub fn options(&self) -> &[FilterOption] {
        match self {
            Selection::Single(option) => std::slice::from_ref(option),
            Selection::Multi(options) => options,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = OptionId> + '_ {
        self.options().iter().map(|o| o.id)
    }

    pub fn contains(&self, id: OptionId) -> bool {
        self.ids().any(|candidate| candidate == id)
    }

    /// True when nothing user-chosen is selected.
    pub fn is_default(&self) -> bool {
        self.options().iter().all(FilterOption::is_default)
    }

    /// Coerces a caller-supplied selection into the shape a filter expects.
    ///
    /// Multi filters get a deduplicated, non-empty collection in which the
    /// default never sits next to real options. Single filters keep the first
    /// real option of a collection, or the default.
    pub fn normalized_for(self, is_multi: bool, default: &FilterOption) -> Self {
        let options = match self {
            Selection::Single(option) => vec![option],
            Selection::Multi(options) => options,
        };

        if !is_multi {
            let chosen = options
                .iter()
                .find(|o| !o.is_default())
                .or_else(|| options.first())
                .cloned()
                .unwrap_or_else(|| default.clone());
            return Selection::Single(chosen);
        }

        let has_real = options.iter().any(|o| !o.is_default());
        let mut seen = HashSet::new();
        let mut kept: Vec<FilterOption> = options
            .into_iter()
            .filter(|o| !(has_real && o.is_default()))
            .filter(|o| seen.insert(o.id))
            .collect();

        if kept.is_empty() {
            kept.push(default.clone());
        }
        Selection::Multi(kept)
    }

    /// Result of a user clicking `option`.
    ///
    /// On a multi selection, clicking the default clears everything else,
    /// clicking a real option removes the default and flips that option, and
    /// removing the last real option falls back to `[default]`. On a single
    /// selection, clicking the selected option again returns to the default.
    pub fn toggled(&self, option: FilterOption, default: &FilterOption) -> Self {
        match self {
            Selection::Single(current) => {
                if current.id == option.id {
                    Selection::Single(default.clone())
                } else {
                    Selection::Single(option)
                }
            }
            Selection::Multi(current) => {
                if option.is_default() {
                    return Selection::Multi(vec![default.clone()]);
                }

                let mut next: Vec<FilterOption> =
                    current.iter().filter(|o| !o.is_default()).cloned().collect();
                if let Some(pos) = next.iter().position(|o| o.id == option.id) {
                    next.remove(pos);
                } else {
                    next.push(option);
                }
                Selection::Multi(next).normalized_for(true, default)
            }
        }
    }
}

impl From<FilterOption> for Selection {
    fn from(option: FilterOption) -> Self {
        Selection::Single(option)
    }
}

impl From<Vec<FilterOption>> for Selection {
    fn from(options: Vec<FilterOption>) -> Self {
        Selection::Multi(options)
    }
}
