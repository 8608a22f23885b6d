//! Capability namespaces and well-known attribute/directive names

use serde::{Deserialize, Serialize};
use std::fmt;

pub const IDENTITY_NAMESPACE: &str = "osgi.identity";
pub const BUNDLE_NAMESPACE: &str = "osgi.wiring.bundle";
pub const HOST_NAMESPACE: &str = "osgi.wiring.host";
pub const PACKAGE_NAMESPACE: &str = "osgi.wiring.package";

pub const VERSION_ATTRIBUTE: &str = "version";
pub const BUNDLE_VERSION_ATTRIBUTE: &str = "bundle-version";
pub const BUNDLE_SYMBOLICNAME_ATTRIBUTE: &str = "bundle-symbolic-name";
pub const TYPE_ATTRIBUTE: &str = "type";
pub const TYPE_BUNDLE: &str = "osgi.bundle";
pub const TYPE_FRAGMENT: &str = "osgi.fragment";

pub const FILTER_DIRECTIVE: &str = "filter";
pub const EFFECTIVE_DIRECTIVE: &str = "effective";
pub const EFFECTIVE_RESOLVE: &str = "resolve";
pub const RESOLUTION_DIRECTIVE: &str = "resolution";
pub const RESOLUTION_OPTIONAL: &str = "optional";
pub const CARDINALITY_DIRECTIVE: &str = "cardinality";
pub const CARDINALITY_MULTIPLE: &str = "multiple";
pub const USES_DIRECTIVE: &str = "uses";
pub const SINGLETON_DIRECTIVE: &str = "singleton";
pub const VISIBILITY_DIRECTIVE: &str = "visibility";
pub const VISIBILITY_REEXPORT: &str = "reexport";

/// Upper bound of a `cardinality:=multiple` requirement
pub const CARDINALITY_UNBOUNDED: usize = usize::MAX;

/// Capability/requirement namespace
///
/// The four wiring namespaces get their own variants so that namespace rules
/// are matched exhaustively; everything else is generic and filter-matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Namespace {
    Identity,
    Bundle,
    Host,
    Package,
    Generic(String),
}

impl Namespace {
    pub fn as_str(&self) -> &str {
        match self {
            Namespace::Identity => IDENTITY_NAMESPACE,
            Namespace::Bundle => BUNDLE_NAMESPACE,
            Namespace::Host => HOST_NAMESPACE,
            Namespace::Package => PACKAGE_NAMESPACE,
            Namespace::Generic(name) => name,
        }
    }

    /// Attribute holding the name of the thing this namespace describes
    pub fn self_attribute(&self) -> Option<&'static str> {
        match self {
            Namespace::Identity => Some(IDENTITY_NAMESPACE),
            Namespace::Bundle => Some(BUNDLE_NAMESPACE),
            Namespace::Host => Some(HOST_NAMESPACE),
            Namespace::Package => Some(PACKAGE_NAMESPACE),
            Namespace::Generic(_) => None,
        }
    }

    /// Attribute holding the version of the thing this namespace describes
    pub fn version_attribute(&self) -> &'static str {
        match self {
            Namespace::Bundle | Namespace::Host => BUNDLE_VERSION_ATTRIBUTE,
            Namespace::Identity | Namespace::Package | Namespace::Generic(_) => VERSION_ATTRIBUTE,
        }
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        match value {
            IDENTITY_NAMESPACE => Namespace::Identity,
            BUNDLE_NAMESPACE => Namespace::Bundle,
            HOST_NAMESPACE => Namespace::Host,
            PACKAGE_NAMESPACE => Namespace::Package,
            other => Namespace::Generic(other.to_string()),
        }
    }
}

impl From<String> for Namespace {
    fn from(value: String) -> Self {
        Namespace::from(value.as_str())
    }
}

impl From<Namespace> for String {
    fn from(namespace: Namespace) -> Self {
        namespace.as_str().to_string()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
