//! Resolver error types
//!
//! A single error enum is shared by the filter parser, the model, the manifest
//! layer and the resolution engine.

use std::fmt;
use thiserror::Error;

use crate::model::ResourceId;

/// Filter syntax error
///
/// Carries the position of the cursor when parsing stopped and the remaining
/// (offending) input from that position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}: \"{remainder}\" (filter: \"{filter}\")")]
pub struct FilterParseError {
    /// What went wrong
    pub message: String,
    /// Character offset into the filter string
    pub position: usize,
    /// Input from `position` to the end
    pub remainder: String,
    /// Full filter string being parsed
    pub filter: String,
}

/// Why a resource did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A mandatory requirement has no candidate from a resolvable provider
    MissingRequirement {
        /// Unsatisfied requirement
        requirement: crate::model::RequirementId,
        /// Namespace and filter of the requirement, for diagnostics
        description: String,
    },
    /// Another singleton with the same symbolic name was selected
    SingletonCollision {
        /// Resource that was selected instead
        selected: ResourceId,
    },
    /// No candidate permutation satisfies the uses constraints of a package
    UsesConflict {
        /// Package whose class space is inconsistent
        package: String,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingRequirement { description, .. } => {
                write!(f, "missing requirement {}", description)
            }
            FailureReason::SingletonCollision { selected } => {
                write!(f, "singleton collision, resource #{} selected", selected.index())
            }
            FailureReason::UsesConflict { package } => {
                write!(f, "uses constraint violation on package {}", package)
            }
        }
    }
}

/// A mandatory resource left unresolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedResource {
    /// Resource handle
    pub resource: ResourceId,
    /// Human-readable identity (`name version`)
    pub identity: String,
    /// Failure cause
    pub reason: FailureReason,
}

/// Aggregated failure for every unresolved mandatory resource of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// Unresolved mandatory resources, in request order
    pub unresolved: Vec<UnresolvedResource>,
}

impl ResolutionFailure {
    /// Handles of the unresolved resources
    pub fn resources(&self) -> Vec<ResourceId> {
        self.unresolved.iter().map(|u| u.resource).collect()
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to resolve {} resource(s)", self.unresolved.len())?;
        for u in &self.unresolved {
            write!(f, "; {}: {}", u.identity, u.reason)?;
        }
        Ok(())
    }
}

/// Resolver errors
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Invalid filter: {0}")]
    Parse(#[from] FilterParseError),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Resolution failed: {0}")]
    Resolution(ResolutionFailure),
}

impl From<toml::de::Error> for ResolverError {
    fn from(e: toml::de::Error) -> Self {
        ResolverError::InvalidManifest(e.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ResolverError>;
