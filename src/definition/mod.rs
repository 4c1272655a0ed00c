pub mod definition;
pub mod set;

pub use definition::FilterDefinition;
pub use set::{ConfigError, FilterDefinitionSet};
