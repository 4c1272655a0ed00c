use std::collections::BTreeMap;

use super::{ancestor_context, read_set, FilterEngine, PassReport, Ticket};
use crate::definition::{ConfigError, FilterDefinition};
use crate::external::ExternalState;
use crate::types::{FilterId, FilterOption, OptionId, Selection};

impl FilterEngine {
    /// Seeds selections from an external state (e.g. URL parameters).
    ///
    /// Filters are resolved ancestors first, each against options fetched with
    /// the already-resolved external values in place of defaults. An id no
    /// provider offers is kept as a placeholder option labelled with the id,
    /// so deep links survive a provider that has not caught up yet. Keys that
    /// name no filter are ignored. Everything is committed as one batch.
    ///
    /// A filter changed by a newer pass while this runs keeps that pass's
    /// value and is reported stale.
    #[tracing::instrument(level = "debug", skip_all, fields(filters = external.len()))]
    pub async fn initialize(&self, external: &ExternalState) -> Result<PassReport, ConfigError> {
        for (id, _) in external.iter() {
            if !self.definitions.contains(id.as_str()) {
                tracing::debug!(key = %id, "ignoring external key with no matching filter");
            }
        }

        let mut seeded: Vec<(&FilterDefinition, Vec<OptionId>)> = Vec::new();
        for def in self.definitions.topological_order() {
            let mut ids = Vec::new();
            for parsed in external.option_ids(def.id.as_str()) {
                match parsed {
                    Ok(id) => ids.push(id),
                    Err(err) => tracing::warn!(error = %err, "skipping malformed external id"),
                }
            }
            if !ids.is_empty() {
                seeded.push((def, ids));
            }
        }

        let tickets = self.guard.issue_all(seeded.iter().map(|(d, _)| &d.id));
        let reads = read_set(seeded.iter().map(|(d, _)| *d));

        let mut rebases = 0;
        loop {
            let (live, taken): (Vec<_>, Vec<_>) = seeded
                .iter()
                .zip(&tickets)
                .partition(|(_, ticket)| self.guard.is_current(ticket));

            let mut report = PassReport {
                stale: taken.iter().map(|((def, _), _)| def.id.clone()).collect(),
                rebases,
                ..PassReport::default()
            };
            if live.is_empty() {
                return Ok(report);
            }

            let base = self.store.snapshot();
            let mut resolved: BTreeMap<FilterId, Selection> = BTreeMap::new();

            for ((def, ids), _) in &live {
                let ancestors = ancestor_context(def, &resolved, &base.selections);
                let options = match self.fetch_options(def, &ancestors).await {
                    Ok(options) => options,
                    Err(err) => {
                        tracing::warn!(
                            filter = %def.id,
                            error = %err,
                            "option fetch failed during initialization"
                        );
                        report.failed.push(def.id.clone());
                        Vec::new().into()
                    }
                };

                let mut chosen = Vec::with_capacity(ids.len());
                for &id in ids {
                    if id.is_default() {
                        chosen.push(def.default_value.clone());
                        continue;
                    }
                    match options.iter().find(|o| o.id == id) {
                        Some(option) => chosen.push(option.clone()),
                        None => {
                            tracing::warn!(filter = %def.id, %id, "external id not offered; keeping placeholder");
                            report.unresolved.push((def.id.clone(), id));
                            chosen.push(FilterOption::placeholder(id));
                        }
                    }
                }

                resolved.insert(def.id.clone(), def.normalize(Selection::Multi(chosen)));
            }

            let live_tickets: Vec<Ticket> = live.iter().map(|(_, ticket)| (*ticket).clone()).collect();
            let outcome = self.guard.commit_if_current(&live_tickets, || {
                self.commit_unless_moved(&base, &reads, resolved)
            });
            match outcome {
                Some(Some((revision, committed))) => {
                    tracing::debug!(revision, committed = committed.len(), "initial state committed");
                    report.revision = Some(revision);
                    report.committed = committed;
                    return Ok(report);
                }
                // A seeded filter was taken over, or the state moved.
                _ => {
                    rebases += 1;
                    tracing::debug!(rebases, "state moved under initialization; recomputing");
                }
            }
        }
    }
}
