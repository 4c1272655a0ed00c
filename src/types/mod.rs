pub mod identifiers;
pub mod option;
pub mod selection;

pub use identifiers::{FilterId, OptionId, StateFingerprint};
pub use option::{AttributeValue, Attributes, FilterOption, DEFAULT_LABEL};
pub use selection::Selection;
