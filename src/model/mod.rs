//! Capability/requirement model
//!
//! Resources, capabilities, requirements, wires and versions. Everything here
//! is plain data; the resolution rules live in [`crate::resolver`].

pub mod attributes;
pub mod namespace;
pub mod resource;
pub mod version;
pub mod wire;

pub use attributes::{AttributeValue, Attributes, Directives};
pub use namespace::{Namespace, CARDINALITY_UNBOUNDED};
pub use resource::{
    Capability, CapabilityDef, CapabilityId, Identity, Repository, Requirement, RequirementDef,
    RequirementId, Resource, ResourceDef, ResourceId, ResourceKind,
};
pub use version::{Version, VersionRange};
pub use wire::{Wire, Wiring};
