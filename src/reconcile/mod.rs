pub mod guard;
pub mod init;
pub mod policy;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::cache::{OptionsCache, OptionsKey};
use crate::config::EngineConfig;
use crate::definition::{ConfigError, FilterDefinition, FilterDefinitionSet};
use crate::provider::{AncestorSelections, ProviderError};
use crate::store::{
    FetchStatus, SelectionSnapshot, SelectionState, SelectionStore, StateWatcher, StatusBoard,
    StatusWatcher,
};
use crate::types::{FilterId, FilterOption, OptionId, Selection};
pub use guard::{RequestGuard, Ticket};
pub use policy::{valid_ids, ReconcilePolicy};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Revision of the committed batch, `None` when nothing was committed.
    pub revision: Option<u64>,
    /// Filters written by the batch.
    pub committed: Vec<FilterId>,
    /// Filters left to a newer pass. A superseded pass lists everything it
    /// would have written and commits nothing.
    pub stale: Vec<FilterId>,
    /// Filters whose provider failed; their selection was left untouched.
    pub failed: Vec<FilterId>,
    /// External ids no provider confirmed, kept as placeholders.
    pub unresolved: Vec<(FilterId, OptionId)>,
    /// How often the pass was recomputed because another pass committed
    /// something it had read.
    pub rebases: u32,
}

/// One attempt at a pass, computed against a single committed snapshot.
struct Draft {
    base: Arc<SelectionSnapshot>,
    batch: BTreeMap<FilterId, Selection>,
    failed: Vec<FilterId>,
}

/// Dependent-filter state engine.
///
/// Owns the definitions, the committed selections and the generation guard.
/// Several passes may be in flight at once on the same engine. A newer pass
/// drops every older pass rooted at a filter it rewrites; passes that do not
/// supersede each other both commit, the later one recomputed on top of the
/// earlier one's result.
#[derive(Debug)]
pub struct FilterEngine {
    definitions: FilterDefinitionSet,
    config: EngineConfig,
    store: SelectionStore,
    guard: RequestGuard,
    cache: OptionsCache,
    statuses: StatusBoard,
}

impl FilterEngine {
    pub fn new(definitions: FilterDefinitionSet) -> Self {
        Self::with_config(definitions, EngineConfig::default())
    }

    pub fn with_config(definitions: FilterDefinitionSet, config: EngineConfig) -> Self {
        let store = SelectionStore::new(&definitions);
        let statuses = StatusBoard::new(&definitions);
        Self {
            definitions,
            config,
            store,
            guard: RequestGuard::new(),
            cache: OptionsCache::new(),
            statuses,
        }
    }

    pub fn definitions(&self) -> &FilterDefinitionSet {
        &self.definitions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn get_selection(&self, id: &str) -> Result<Selection, ConfigError> {
        let def = self.definitions.get(id)?;
        Ok(self
            .store
            .get(id)
            .unwrap_or_else(|| def.default_selection()))
    }

    pub fn snapshot(&self) -> Arc<SelectionSnapshot> {
        self.store.snapshot()
    }

    /// Notified after every committed batch. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> StateWatcher {
        self.store.subscribe()
    }

    pub fn statuses(&self) -> StatusWatcher {
        self.statuses.subscribe()
    }

    pub fn fetch_status(&self, id: &str) -> Result<FetchStatus, ConfigError> {
        self.definitions.get(id)?;
        Ok(self.statuses.get(id).unwrap_or(FetchStatus::Idle))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Returns every filter to its default and supersedes all passes still in
    /// flight, in one step.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn reset(&self) {
        let revision = self
            .guard
            .invalidate_with(self.definitions.iter().map(|d| &d.id), || self.store.reset());
        tracing::debug!(revision, "selections reset to defaults");
    }

    /// Options to render for `id` under the committed state: the filter's
    /// default first, then whatever the provider offers. A failing provider
    /// yields the default alone.
    pub async fn options(&self, id: &str) -> Result<Vec<FilterOption>, ConfigError> {
        let def = self.definitions.get(id)?;
        let snapshot = self.store.snapshot();
        let ancestors = ancestor_context(def, &BTreeMap::new(), &snapshot.selections);

        let mut out = vec![def.default_value.clone()];
        match self.fetch_options(def, &ancestors).await {
            Ok(options) => out.extend(options.iter().cloned()),
            Err(err) => {
                tracing::warn!(filter = %def.id, error = %err, "option fetch failed; offering default only");
            }
        }
        Ok(out)
    }

    /// Sets `id` to `selection` and reconciles every descendant.
    ///
    /// Descendants are processed one at a time in topological order, each
    /// seeing the values already decided earlier in the same pass. The change
    /// and all decided descendants are committed as one batch. A provider
    /// failure leaves that descendant untouched and never aborts the pass.
    ///
    /// If another pass commits a value this one read while it was fetching,
    /// the pass is recomputed on top of it. When that moved one of `id`'s own
    /// ancestors, `selection` is itself checked against the options offered
    /// under the new ancestors.
    #[tracing::instrument(level = "debug", skip(self, selection))]
    pub async fn apply_change(
        &self,
        id: &str,
        selection: impl Into<Selection>,
    ) -> Result<PassReport, ConfigError> {
        let def = self.definitions.get(id)?;
        let requested = def.normalize(selection.into());
        let descendants = self.definitions.descendants_of(id)?;

        let ticket = self.guard.begin(&def.id, descendants.iter().map(|d| &d.id));
        let reads = read_set(std::iter::once(def).chain(descendants.iter().copied()));
        let chosen_under = ancestor_context(def, &BTreeMap::new(), &self.store.snapshot().selections);

        tracing::debug!(
            generation = ticket.generation(),
            descendants = descendants.len(),
            "reconciliation pass started"
        );

        let mut report = PassReport::default();
        loop {
            let draft = self
                .draft_change(def, &requested, &chosen_under, &descendants, &ticket)
                .await;
            let Some(Draft { base, batch, failed }) = draft else {
                return Ok(superseded(report, std::iter::once(def).chain(descendants)));
            };

            let outcome = self.guard.commit_if_current(std::slice::from_ref(&ticket), || {
                self.commit_unless_moved(&base, &reads, batch)
            });
            match outcome {
                None => return Ok(superseded(report, std::iter::once(def).chain(descendants))),
                Some(None) => {
                    report.rebases += 1;
                    tracing::debug!(rebases = report.rebases, "state moved under the pass; recomputing");
                }
                Some(Some((revision, committed))) => {
                    tracing::debug!(revision, committed = committed.len(), "pass committed");
                    report.revision = Some(revision);
                    report.committed = committed;
                    report.failed = failed;
                    return Ok(report);
                }
            }
        }
    }

    /// Computes one attempt of an `apply_change` pass against the latest
    /// committed snapshot. `None` once the pass has been superseded.
    async fn draft_change(
        &self,
        def: &FilterDefinition,
        requested: &Selection,
        chosen_under: &AncestorSelections,
        descendants: &[&FilterDefinition],
        ticket: &Ticket,
    ) -> Option<Draft> {
        let base = self.store.snapshot();
        let mut pending: BTreeMap<FilterId, Selection> = BTreeMap::new();
        let mut batch: BTreeMap<FilterId, Selection> = BTreeMap::new();
        let mut failed = Vec::new();

        let context = ancestor_context(def, &pending, &base.selections);
        let root = if context == *chosen_under {
            requested.clone()
        } else {
            match self.reconcile_one(def, requested, &context).await {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!(filter = %def.id, error = %err, "option fetch failed; keeping requested selection");
                    failed.push(def.id.clone());
                    requested.clone()
                }
            }
        };
        pending.insert(def.id.clone(), root.clone());
        batch.insert(def.id.clone(), root);

        for descendant in descendants {
            // Don't fetch for a pass that can no longer commit.
            if !self.guard.is_current(ticket) {
                tracing::debug!(filter = %descendant.id, "pass superseded; discarding");
                return None;
            }

            let current = base
                .get(descendant.id.as_str())
                .cloned()
                .unwrap_or_else(|| descendant.default_selection());
            let ancestors = ancestor_context(descendant, &pending, &base.selections);

            match self.reconcile_one(descendant, &current, &ancestors).await {
                Ok(next) => {
                    let kept = next == current;
                    tracing::trace!(filter = %descendant.id, kept, "descendant reconciled");
                    pending.insert(descendant.id.clone(), next.clone());
                    batch.insert(descendant.id.clone(), next);
                }
                Err(err) => {
                    tracing::warn!(
                        filter = %descendant.id,
                        error = %err,
                        "option fetch failed; keeping current selection"
                    );
                    failed.push(descendant.id.clone());
                    pending.insert(descendant.id.clone(), current);
                }
            }
        }

        Some(Draft { base, batch, failed })
    }

    /// Decides `def`'s next selection under `ancestors` with the configured
    /// policy. Fails only when the options had to be fetched and could not be.
    async fn reconcile_one(
        &self,
        def: &FilterDefinition,
        current: &Selection,
        ancestors: &AncestorSelections,
    ) -> Result<Selection, ProviderError> {
        let valid: HashSet<OptionId> = if self.config.policy.needs_options() {
            valid_ids(&self.fetch_options(def, ancestors).await?)
        } else {
            HashSet::new()
        };
        Ok(self.config.policy.reconcile(def, current, &valid))
    }

    /// Writes `batch` unless a filter in `reads` changed since `base`.
    /// Must run under the generation lock.
    fn commit_unless_moved(
        &self,
        base: &SelectionSnapshot,
        reads: &BTreeSet<FilterId>,
        batch: BTreeMap<FilterId, Selection>,
    ) -> Option<(u64, Vec<FilterId>)> {
        let latest = self.store.snapshot();
        let moved = latest.revision != base.revision
            && reads
                .iter()
                .any(|id| latest.get(id.as_str()) != base.get(id.as_str()));
        if moved {
            return None;
        }

        let committed = batch.keys().cloned().collect();
        Some((self.store.commit_batch(batch), committed))
    }

    async fn fetch_options(
        &self,
        def: &FilterDefinition,
        ancestors: &AncestorSelections,
    ) -> Result<Arc<[FilterOption]>, ProviderError> {
        let key = self.config.cache_options.then(|| {
            OptionsKey::new(def.id.clone(), ancestors, &self.config.extra_dependencies)
        });

        if let Some(hit) = key.as_ref().and_then(|k| self.cache.get(k)) {
            tracing::debug!(filter = %def.id, "options cache hit");
            self.statuses
                .set(&def.id, FetchStatus::Ready { options: hit.len() });
            return Ok(hit);
        }

        self.statuses.set(&def.id, FetchStatus::Loading);
        match def.provider.fetch(ancestors).await {
            Ok(options) => {
                // providers are supposed to return real options only
                let options: Arc<[FilterOption]> =
                    options.into_iter().filter(|o| !o.is_default()).collect();
                if let Some(key) = key {
                    self.cache.insert(key, Arc::clone(&options));
                }
                self.statuses
                    .set(&def.id, FetchStatus::Ready { options: options.len() });
                Ok(options)
            }
            Err(err) => {
                self.statuses.set(
                    &def.id,
                    FetchStatus::Failed {
                        error: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }
}

/// Ancestor values for `def`: values decided earlier in this pass win over
/// committed ones. Single selections become one-element collections.
fn ancestor_context(
    def: &FilterDefinition,
    pending: &BTreeMap<FilterId, Selection>,
    committed: &SelectionState,
) -> AncestorSelections {
    let mut ancestors = AncestorSelections::new();
    for ancestor in &def.depends_on {
        let options = pending
            .get(ancestor)
            .or_else(|| committed.get(ancestor.as_str()))
            .map(|s| s.options().to_vec())
            .unwrap_or_default();
        ancestors.push(ancestor.clone(), options);
    }
    ancestors
}

/// Committed filters a pass writing `targets` depends on: the targets
/// themselves and everything they list in `depends_on`.
fn read_set<'a>(targets: impl IntoIterator<Item = &'a FilterDefinition>) -> BTreeSet<FilterId> {
    let mut reads = BTreeSet::new();
    for def in targets {
        reads.insert(def.id.clone());
        reads.extend(def.depends_on.iter().cloned());
    }
    reads
}

fn superseded<'a>(
    report: PassReport,
    targets: impl IntoIterator<Item = &'a FilterDefinition>,
) -> PassReport {
    let stale: Vec<FilterId> = targets.into_iter().map(|d| d.id.clone()).collect();
    tracing::debug!(stale = ?stale, "pass superseded by a newer one");
    PassReport {
        stale,
        rebases: report.rebases,
        ..PassReport::default()
    }
}
