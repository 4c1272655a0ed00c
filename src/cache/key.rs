use crate::provider::AncestorSelections;
use crate::types::{FilterId, OptionId};

/// Structural cache key for one provider call.
///
/// Ancestor ids are sorted per ancestor so that `[A, B]` and `[B, A]` hit the
/// same entry; ancestor order itself is kept because it follows `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionsKey {
    pub filter: FilterId,
    pub ancestors: Vec<(FilterId, Vec<OptionId>)>,
    pub extra: Vec<String>,
}

impl OptionsKey {
    pub fn new(filter: FilterId, ancestors: &AncestorSelections, extra: &[String]) -> Self {
        let ancestors = ancestors
            .iter()
            .map(|(id, options)| {
                let mut ids: Vec<OptionId> = options.iter().map(|o| o.id).collect();
                ids.sort();
                ids.dedup();
                (id.clone(), ids)
            })
            .collect();

        Self {
            filter,
            ancestors,
            extra: extra.to_vec(),
        }
    }
}
