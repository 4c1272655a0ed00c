//! Dependent-filter state engine.
//!
//! `cascade-core` tracks the selection of every filter in a dependency DAG
//! (continent → country → region → city → store …), fetches each filter's
//! options from a pluggable provider, and keeps descendant selections valid
//! whenever an ancestor changes. Descendants are reconciled in topological
//! order, committed as one atomic batch, and guarded by per-filter
//! generations so a superseded pass can never overwrite a newer one.
//!
//! ```ignore
//! let definitions = FilterDefinitionSet::new(vec![
//!     FilterDefinition::new("continent", continents),
//!     FilterDefinition::new("country", countries).depends_on(["continent"]),
//!     FilterDefinition::new("store", stores).depends_on(["country"]).multi(),
//! ])?;
//! let engine = FilterEngine::new(definitions);
//! engine.apply_change("continent", asia).await?;
//! ```

pub mod cache;
pub mod config;
pub mod definition;
pub mod external;
pub mod provider;
pub mod reconcile;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use definition::{ConfigError, FilterDefinition, FilterDefinitionSet};
pub use external::ExternalState;
pub use provider::{AncestorSelections, OptionProvider, ProviderError};
pub use reconcile::{FilterEngine, PassReport, ReconcilePolicy};
pub use types::{FilterId, FilterOption, OptionId, Selection};
