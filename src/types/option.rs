use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::identifiers::OptionId;

/// Label of the default sentinel option.
pub const DEFAULT_LABEL: &str = "All";

/// One domain field of an option. Backends send ids as numbers or as numeric
/// strings, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(i64),
    Text(String),
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        AttributeValue::Number(i64::from(n))
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

/// Everything an option carries besides `id` and `label`. Links to ancestor
/// options follow the `<ancestor>_id` naming (`continent_id`, `city_id`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// The option of `ancestor` this option belongs to, if it names one.
    pub fn link(&self, ancestor: &str) -> Option<OptionId> {
        match self.0.get(&format!("{ancestor}_id"))? {
            AttributeValue::Number(n) => Some(OptionId::new(*n)),
            AttributeValue::Text(s) => s.parse().ok(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A selectable value produced by an option provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: OptionId,
    pub label: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl FilterOption {
    pub fn new(id: impl Into<OptionId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            attributes: Attributes::default(),
        }
    }

    /// The `{ id: -1, label: "All" }` sentinel.
    pub fn all() -> Self {
        Self::new(OptionId::DEFAULT, DEFAULT_LABEL)
    }

    /// Stand-in for an externally supplied id that no provider has confirmed
    /// yet. The label is synthesized from the id.
    pub fn placeholder(id: OptionId) -> Self {
        Self::new(id, id.to_string())
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.0.insert(key.into(), value.into());
        self
    }

    pub fn is_default(&self) -> bool {
        self.id.is_default()
    }
}
