use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique name of a filter, e.g. `"country"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(String);

impl FilterId {
    pub fn new(id: impl Into<String>) -> Self {
        FilterId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterId {
    fn from(s: &str) -> Self {
        FilterId(s.to_string())
    }
}

impl From<String> for FilterId {
    fn from(s: String) -> Self {
        FilterId(s)
    }
}

impl std::borrow::Borrow<str> for FilterId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a single option.
///
/// `-1` is reserved for the default sentinel ("All"), which matches anything
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(i64);

impl OptionId {
    pub const DEFAULT: OptionId = OptionId(-1);

    pub const fn new(id: i64) -> Self {
        OptionId(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OptionId {
    fn from(id: i64) -> Self {
        OptionId(id)
    }
}

impl From<i32> for OptionId {
    fn from(id: i32) -> Self {
        OptionId(i64::from(id))
    }
}

impl FromStr for OptionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(OptionId)
    }
}

/// Content hash of an external state encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateFingerprint(String);

impl StateFingerprint {
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);

        let hash = hasher.finalize();
        let hex = hex::encode(hash);

        StateFingerprint(format!("sha256:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
