//! Resources, capabilities and requirements
//!
//! All three live in a [`Repository`] arena and are addressed by opaque IDs.
//! Owner back-references are plain IDs, so navigation from a capability or a
//! requirement to its resource is a single index.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::attributes::{AttributeValue, Attributes, Directives};
use super::namespace::*;
use super::version::Version;
use crate::error::ResolverError;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Position in the owning arena
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to a resource in a [`Repository`]
    ResourceId
);
arena_id!(
    /// Handle to a capability in a [`Repository`]
    CapabilityId
);
arena_id!(
    /// Handle to a requirement in a [`Repository`]
    RequirementId
);

/// Whether a resource is a standalone bundle or attaches to a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Bundle,
    Fragment,
}

/// Resource identity, derived from its `osgi.identity` capability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub version: Version,
    pub kind: ResourceKind,
    pub singleton: bool,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// A capability offered by a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    resource: ResourceId,
    namespace: Namespace,
    attributes: Attributes,
    directives: Directives,
}

impl Capability {
    /// Providing resource
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// Value of the namespace's self attribute (package name, bundle name, ...)
    pub fn name(&self) -> Option<&str> {
        self.namespace
            .self_attribute()
            .and_then(|attr| self.attributes.get(attr))
            .and_then(AttributeValue::as_str)
    }

    /// Value of the namespace's version attribute, `0.0.0` when absent
    pub fn version(&self) -> Version {
        self.attributes
            .get(self.namespace.version_attribute())
            .and_then(AttributeValue::as_version)
            .unwrap_or_default()
    }

    /// Packages named by the `uses` directive
    pub fn uses(&self) -> Vec<String> {
        self.directives
            .get(USES_DIRECTIVE)
            .map(|uses| {
                uses.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A requirement declared by a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    resource: ResourceId,
    namespace: Namespace,
    attributes: Attributes,
    directives: Directives,
}

impl Requirement {
    /// Requiring resource
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// The `filter` directive
    pub fn filter(&self) -> Option<&str> {
        self.directives.get(FILTER_DIRECTIVE).map(String::as_str)
    }

    pub fn is_optional(&self) -> bool {
        self.directives.get(RESOLUTION_DIRECTIVE).map(String::as_str) == Some(RESOLUTION_OPTIONAL)
    }

    /// Maximum number of wires this requirement may produce
    pub fn cardinality(&self) -> usize {
        if self.directives.get(CARDINALITY_DIRECTIVE).map(String::as_str) == Some(CARDINALITY_MULTIPLE) {
            CARDINALITY_UNBOUNDED
        } else {
            1
        }
    }

    pub fn is_reexport(&self) -> bool {
        self.directives.get(VISIBILITY_DIRECTIVE).map(String::as_str) == Some(VISIBILITY_REEXPORT)
    }

    /// `namespace filter` summary for diagnostics
    pub fn describe(&self) -> String {
        format!("{} {}", self.namespace, self.filter().unwrap_or("(*)"))
    }
}

/// A resource: identity plus owned capabilities and requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    identity: Identity,
    capabilities: Vec<CapabilityId>,
    requirements: Vec<RequirementId>,
}

impl Resource {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_fragment(&self) -> bool {
        self.identity.kind == ResourceKind::Fragment
    }
}

/// Capability declaration, before it is owned by a resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityDef {
    pub namespace: Option<Namespace>,
    pub attributes: Attributes,
    pub directives: Directives,
}

impl CapabilityDef {
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key.into(), value.into());
        self
    }
}

/// Requirement declaration, before it is owned by a resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementDef {
    pub namespace: Option<Namespace>,
    pub attributes: Attributes,
    pub directives: Directives,
}

impl RequirementDef {
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn filter(self, filter: impl Into<String>) -> Self {
        self.directive(FILTER_DIRECTIVE, filter)
    }

    pub fn optional(self) -> Self {
        self.directive(RESOLUTION_DIRECTIVE, RESOLUTION_OPTIONAL)
    }

    pub fn multiple(self) -> Self {
        self.directive(CARDINALITY_DIRECTIVE, CARDINALITY_MULTIPLE)
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key.into(), value.into());
        self
    }
}

/// Resource declaration
///
/// ```
/// use bllvm_resolver::model::{ResourceDef, Version};
///
/// let def = ResourceDef::bundle("com.example.a", Version::new(1, 0, 0))
///     .export_package("com.example.a.api", Version::new(1, 0, 0), &[])
///     .import_package("(&(osgi.wiring.package=com.example.b)(version>=1.0.0))");
/// assert_eq!(def.requirements.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDef {
    pub capabilities: Vec<CapabilityDef>,
    pub requirements: Vec<RequirementDef>,
}

impl ResourceDef {
    /// Empty declaration; an identity capability must be added explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// A bundle with identity, bundle and host capabilities
    pub fn bundle(name: impl Into<String>, version: Version) -> Self {
        let name = name.into();
        Self::new()
            .capability(
                CapabilityDef::new(Namespace::Identity)
                    .attribute(IDENTITY_NAMESPACE, name.as_str())
                    .attribute(VERSION_ATTRIBUTE, version.clone())
                    .attribute(TYPE_ATTRIBUTE, TYPE_BUNDLE),
            )
            .capability(
                CapabilityDef::new(Namespace::Bundle)
                    .attribute(BUNDLE_NAMESPACE, name.as_str())
                    .attribute(BUNDLE_VERSION_ATTRIBUTE, version.clone()),
            )
            .capability(
                CapabilityDef::new(Namespace::Host)
                    .attribute(HOST_NAMESPACE, name.as_str())
                    .attribute(BUNDLE_VERSION_ATTRIBUTE, version),
            )
    }

    /// A fragment attaching to the hosts matched by `host_filter`
    pub fn fragment(name: impl Into<String>, version: Version, host_filter: &str) -> Self {
        let name = name.into();
        Self::new()
            .capability(
                CapabilityDef::new(Namespace::Identity)
                    .attribute(IDENTITY_NAMESPACE, name.as_str())
                    .attribute(VERSION_ATTRIBUTE, version)
                    .attribute(TYPE_ATTRIBUTE, TYPE_FRAGMENT),
            )
            .requirement(RequirementDef::new(Namespace::Host).filter(host_filter))
    }

    /// Mark the identity and bundle capabilities `singleton:=true`
    pub fn singleton(mut self) -> Self {
        for cap in &mut self.capabilities {
            if matches!(cap.namespace, Some(Namespace::Identity) | Some(Namespace::Bundle)) {
                cap.directives
                    .insert(SINGLETON_DIRECTIVE.to_string(), "true".to_string());
            }
        }
        self
    }

    pub fn export_package(self, package: &str, version: Version, uses: &[&str]) -> Self {
        let mut cap = CapabilityDef::new(Namespace::Package)
            .attribute(PACKAGE_NAMESPACE, package)
            .attribute(VERSION_ATTRIBUTE, version);
        if !uses.is_empty() {
            cap = cap.directive(USES_DIRECTIVE, uses.join(","));
        }
        self.capability(cap)
    }

    pub fn import_package(self, filter: &str) -> Self {
        self.requirement(RequirementDef::new(Namespace::Package).filter(filter))
    }

    pub fn import_package_optional(self, filter: &str) -> Self {
        self.requirement(RequirementDef::new(Namespace::Package).filter(filter).optional())
    }

    pub fn require_bundle(self, filter: &str) -> Self {
        self.requirement(RequirementDef::new(Namespace::Bundle).filter(filter))
    }

    pub fn capability(mut self, capability: CapabilityDef) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn requirement(mut self, requirement: RequirementDef) -> Self {
        self.requirements.push(requirement);
        self
    }
}

/// Arena owning every resource, capability and requirement
#[derive(Debug, Clone, Default)]
pub struct Repository {
    resources: Vec<Resource>,
    capabilities: Vec<Capability>,
    requirements: Vec<Requirement>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource declaration, returning its handle
    ///
    /// The identity is taken from the declaration's `osgi.identity` capability.
    pub fn add(&mut self, def: ResourceDef) -> Result<ResourceId, ResolverError> {
        let identity = Self::derive_identity(&def)?;

        for cap in &def.capabilities {
            let namespace = cap.namespace.as_ref().ok_or_else(|| {
                ResolverError::InvalidResource(format!("{}: capability without namespace", identity))
            })?;
            if let Some(attr) = namespace.self_attribute() {
                if !cap.attributes.contains_key(attr) {
                    return Err(ResolverError::InvalidResource(format!(
                        "{}: {} capability is missing the {} attribute",
                        identity, namespace, attr
                    )));
                }
            }
        }
        if def.requirements.iter().any(|r| r.namespace.is_none()) {
            return Err(ResolverError::InvalidResource(format!(
                "{}: requirement without namespace",
                identity
            )));
        }

        let id = ResourceId(self.resources.len());
        let mut capabilities = Vec::with_capacity(def.capabilities.len());
        for cap in def.capabilities {
            let namespace = cap.namespace.unwrap_or(Namespace::Identity);
            let mut attributes = cap.attributes;
            if namespace == Namespace::Package {
                attributes
                    .entry(BUNDLE_SYMBOLICNAME_ATTRIBUTE.to_string())
                    .or_insert_with(|| AttributeValue::String(identity.name.clone()));
                attributes
                    .entry(BUNDLE_VERSION_ATTRIBUTE.to_string())
                    .or_insert_with(|| AttributeValue::Version(identity.version.clone()));
            }
            capabilities.push(CapabilityId(self.capabilities.len()));
            self.capabilities.push(Capability {
                resource: id,
                namespace,
                attributes,
                directives: cap.directives,
            });
        }
        let mut requirements = Vec::with_capacity(def.requirements.len());
        for req in def.requirements {
            requirements.push(RequirementId(self.requirements.len()));
            self.requirements.push(Requirement {
                resource: id,
                namespace: req.namespace.unwrap_or(Namespace::Identity),
                attributes: req.attributes,
                directives: req.directives,
            });
        }

        self.resources.push(Resource {
            identity,
            capabilities,
            requirements,
        });
        Ok(id)
    }

    fn derive_identity(def: &ResourceDef) -> Result<Identity, ResolverError> {
        let cap = def
            .capabilities
            .iter()
            .find(|c| c.namespace == Some(Namespace::Identity))
            .ok_or_else(|| {
                ResolverError::InvalidResource("resource has no osgi.identity capability".to_string())
            })?;

        let name = cap
            .attributes
            .get(IDENTITY_NAMESPACE)
            .and_then(AttributeValue::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ResolverError::InvalidResource("identity capability has no name".to_string())
            })?
            .to_string();

        let version = match cap.attributes.get(VERSION_ATTRIBUTE) {
            Some(value) => value.as_version().ok_or_else(|| {
                ResolverError::InvalidResource(format!("{}: invalid identity version {}", name, value))
            })?,
            None => Version::empty(),
        };

        let kind = match cap.attributes.get(TYPE_ATTRIBUTE).and_then(AttributeValue::as_str) {
            Some(TYPE_FRAGMENT) => ResourceKind::Fragment,
            _ => ResourceKind::Bundle,
        };

        let singleton = cap.directives.get(SINGLETON_DIRECTIVE).map(String::as_str) == Some("true");

        Ok(Identity {
            name,
            version,
            kind,
            singleton,
        })
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn capability(&self, id: CapabilityId) -> &Capability {
        &self.capabilities[id.0]
    }

    pub fn requirement(&self, id: RequirementId) -> &Requirement {
        &self.requirements[id.0]
    }

    pub fn identity(&self, id: ResourceId) -> &Identity {
        &self.resources[id.0].identity
    }

    /// Capabilities of a resource, optionally restricted to one namespace
    pub fn capabilities<'a>(
        &'a self,
        resource: ResourceId,
        namespace: Option<&'a Namespace>,
    ) -> impl Iterator<Item = CapabilityId> + 'a {
        self.resources[resource.0]
            .capabilities
            .iter()
            .copied()
            .filter(move |c| namespace.map_or(true, |ns| self.capabilities[c.0].namespace == *ns))
    }

    /// Requirements of a resource, optionally restricted to one namespace
    pub fn requirements<'a>(
        &'a self,
        resource: ResourceId,
        namespace: Option<&'a Namespace>,
    ) -> impl Iterator<Item = RequirementId> + 'a {
        self.resources[resource.0]
            .requirements
            .iter()
            .copied()
            .filter(move |r| namespace.map_or(true, |ns| self.requirements[r.0].namespace == *ns))
    }

    /// Every capability in `namespace`, in registration order
    pub fn capabilities_in<'a>(
        &'a self,
        namespace: &'a Namespace,
    ) -> impl Iterator<Item = CapabilityId> + 'a {
        self.capabilities
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.namespace == *namespace)
            .map(|(i, _)| CapabilityId(i))
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> {
        (0..self.resources.len()).map(ResourceId)
    }

    /// Look up a resource by symbolic name, optionally pinned to a version
    ///
    /// Without a version the highest registered version is returned.
    pub fn find(&self, name: &str, version: Option<&Version>) -> Option<ResourceId> {
        self.resource_ids()
            .filter(|id| {
                let identity = self.identity(*id);
                identity.name == name && version.map_or(true, |v| identity.version == *v)
            })
            .max_by(|a, b| {
                self.identity(*a)
                    .version
                    .cmp(&self.identity(*b).version)
                    .then_with(|| b.cmp(a))
            })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
