//! Capability attribute values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::version::Version;

/// Typed attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Long(i64),
    Version(Version),
    String(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// The value as a string, when it holds one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a version; strings are parsed
    pub fn as_version(&self) -> Option<Version> {
        match self {
            AttributeValue::Version(v) => Some(v.clone()),
            AttributeValue::String(s) => Version::parse(s).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Long(n) => write!(f, "{}", n),
            AttributeValue::Version(v) => write!(f, "{}", v),
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<Version> for AttributeValue {
    fn from(value: Version) -> Self {
        AttributeValue::Version(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Long(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::List(value)
    }
}

/// Attribute map; ordered so that iteration is deterministic
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Directive map
pub type Directives = BTreeMap<String, String>;
