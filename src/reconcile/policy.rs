use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::definition::FilterDefinition;
use crate::types::{FilterOption, OptionId, Selection};

/// What happens to a descendant's selection when an ancestor changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Keep whatever is still offered under the new ancestor context.
    #[default]
    KeepIfValid,
    /// Unconditionally return every descendant to its default.
    AlwaysReset,
}

impl ReconcilePolicy {
    /// Whether the decision depends on freshly fetched options.
    pub fn needs_options(self) -> bool {
        matches!(self, ReconcilePolicy::KeepIfValid)
    }

    /// Decides `def`'s next selection given the ids its provider now offers.
    ///
    /// The default sentinel is always valid. The result is never an empty
    /// collection.
    pub fn reconcile(
        self,
        def: &FilterDefinition,
        current: &Selection,
        valid: &HashSet<OptionId>,
    ) -> Selection {
        if self == ReconcilePolicy::AlwaysReset {
            return def.default_selection();
        }

        let is_valid = |option: &FilterOption| option.is_default() || valid.contains(&option.id);

        match def.normalize(current.clone()) {
            Selection::Single(option) => {
                if is_valid(&option) {
                    Selection::Single(option)
                } else {
                    def.default_selection()
                }
            }
            Selection::Multi(options) => {
                let kept: Vec<FilterOption> = options.into_iter().filter(|o| is_valid(o)).collect();
                Selection::multi(kept, &def.default_value)
            }
        }
    }
}

pub fn valid_ids(options: &[FilterOption]) -> HashSet<OptionId> {
    options.iter().map(|o| o.id).collect()
}
