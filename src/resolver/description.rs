//! Internal resource descriptions
//!
//! Bundle, host and package requirements are re-expressed as a name, a
//! version range and extra attribute constraints extracted from their filter.
//! Requirements in every other namespace keep the parsed filter.

use std::collections::BTreeMap;

use crate::error::ResolverError;
use crate::filter::{extract_standard_attributes, FilterComponent};
use crate::model::namespace::{BUNDLE_VERSION_ATTRIBUTE, VERSION_ATTRIBUTE};
use crate::model::{
    AttributeValue, Capability, CapabilityId, Namespace, Repository, RequirementId, ResourceId,
    VersionRange,
};

const VERSION_ATTRIBUTES: &[&str] = &[VERSION_ATTRIBUTE, BUNDLE_VERSION_ATTRIBUTE];

/// Name + version range requirement for the wiring namespaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSpec {
    pub name: String,
    pub range: VersionRange,
    /// Other equality constraints (e.g. `bundle-symbolic-name`)
    pub attributes: BTreeMap<String, String>,
    /// Other version constraints (e.g. `bundle-version` on a package import)
    pub ranges: BTreeMap<String, VersionRange>,
}

impl NamedSpec {
    /// Translate the filter of a bundle, host or package requirement
    pub fn from_filter(namespace: &Namespace, filter: Option<&str>) -> Result<Self, ResolverError> {
        let filter = filter.map(FilterComponent::parse).transpose()?;
        Self::extract(namespace, filter.as_ref())
    }

    fn extract(namespace: &Namespace, filter: Option<&FilterComponent>) -> Result<Self, ResolverError> {
        let filter = filter.ok_or_else(|| {
            ResolverError::InvalidAttribute(format!("{} requirement has no filter", namespace))
        })?;
        let self_attribute = namespace.self_attribute().unwrap_or(VERSION_ATTRIBUTE);
        let version_attribute = namespace.version_attribute();

        let mut standard = extract_standard_attributes(filter, VERSION_ATTRIBUTES)?;
        let name = standard.remove(self_attribute).ok_or_else(|| {
            ResolverError::InvalidAttribute(format!(
                "{} requirement filter {} does not name a {}",
                namespace, filter, self_attribute
            ))
        })?;
        let range = standard
            .remove(version_attribute)
            .map(|r| VersionRange::parse(&r))
            .transpose()?
            .unwrap_or_default();

        let mut attributes = BTreeMap::new();
        let mut ranges = BTreeMap::new();
        for (key, value) in standard {
            if VERSION_ATTRIBUTES.contains(&key.as_str()) {
                ranges.insert(key, VersionRange::parse(&value)?);
            } else {
                attributes.insert(key, value);
            }
        }

        Ok(Self {
            name,
            range,
            attributes,
            ranges,
        })
    }

    fn matches(&self, capability: &Capability) -> bool {
        if capability.name() != Some(self.name.as_str()) {
            return false;
        }
        if !self.range.includes(&capability.version()) {
            return false;
        }
        let attrs = capability.attributes();
        self.attributes
            .iter()
            .all(|(k, v)| attrs.get(k).map_or(false, |actual| actual.to_string() == *v))
            && self.ranges.iter().all(|(k, range)| {
                attrs
                    .get(k)
                    .and_then(AttributeValue::as_version)
                    .map_or(false, |v| range.includes(&v))
            })
    }
}

/// Namespace-specific requirement specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSpec {
    Bundle(NamedSpec),
    Host(NamedSpec),
    Package(NamedSpec),
    /// `None` matches every capability in the namespace
    Generic(Option<FilterComponent>),
}

impl RequirementSpec {
    /// Translate a repository requirement
    pub fn from_requirement(repository: &Repository, id: RequirementId) -> Result<Self, ResolverError> {
        let requirement = repository.requirement(id);
        let filter = requirement.filter().map(FilterComponent::parse).transpose()?;

        let namespace = requirement.namespace();
        Ok(match namespace {
            Namespace::Bundle => RequirementSpec::Bundle(NamedSpec::extract(namespace, filter.as_ref())?),
            Namespace::Host => RequirementSpec::Host(NamedSpec::extract(namespace, filter.as_ref())?),
            Namespace::Package => RequirementSpec::Package(NamedSpec::extract(namespace, filter.as_ref())?),
            Namespace::Identity | Namespace::Generic(_) => RequirementSpec::Generic(filter),
        })
    }

    /// Whether `capability` satisfies this specification
    pub fn matches(&self, capability: &Capability) -> bool {
        match self {
            RequirementSpec::Bundle(spec) | RequirementSpec::Host(spec) | RequirementSpec::Package(spec) => {
                spec.matches(capability)
            }
            RequirementSpec::Generic(None) => true,
            RequirementSpec::Generic(Some(filter)) => filter.matches(capability.attributes()),
        }
    }
}

/// A requirement prepared for solving
#[derive(Debug, Clone)]
pub struct RequirementDescription {
    pub id: RequirementId,
    pub namespace: Namespace,
    pub spec: RequirementSpec,
    pub optional: bool,
    pub cardinality: usize,
    pub reexport: bool,
}

impl RequirementDescription {
    pub fn is_mandatory(&self) -> bool {
        !self.optional
    }
}

/// A resource prepared for solving; ineffective requirements are absent
#[derive(Debug, Clone)]
pub struct Description {
    pub resource: ResourceId,
    pub requirements: Vec<RequirementDescription>,
    /// Exported packages by name
    pub exports: BTreeMap<String, CapabilityId>,
}

impl Description {
    pub fn requirement(&self, id: RequirementId) -> Option<&RequirementDescription> {
        self.requirements.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceDef, Version};

    fn repo_with(def: ResourceDef) -> (Repository, ResourceId) {
        let mut repo = Repository::new();
        let id = repo.add(def).unwrap();
        (repo, id)
    }

    #[test]
    fn test_package_spec_extraction() {
        let (repo, id) = repo_with(
            ResourceDef::bundle("a", Version::new(1, 0, 0))
                .import_package("(&(osgi.wiring.package=com.x)(version>=1.0.0)(!(version>=2.0.0)))"),
        );
        let req = repo.requirements(id, None).next().unwrap();
        match RequirementSpec::from_requirement(&repo, req).unwrap() {
            RequirementSpec::Package(spec) => {
                assert_eq!(spec.name, "com.x");
                assert_eq!(spec.range.to_string(), "[1.0.0,2.0.0)");
                assert!(spec.attributes.is_empty());
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_package_spec_matching() {
        let mut repo = Repository::new();
        let provider = repo
            .add(ResourceDef::bundle("b", Version::new(1, 0, 0)).export_package(
                "com.x",
                Version::new(1, 5, 0),
                &[],
            ))
            .unwrap();
        let cap = repo.capabilities(provider, Some(&Namespace::Package)).next().unwrap();
        let consumer = repo
            .add(
                ResourceDef::bundle("a", Version::new(1, 0, 0))
                    .import_package("(&(osgi.wiring.package=com.x)(version>=1.0.0)(!(version>=2.0.0)))")
                    .import_package("(&(osgi.wiring.package=com.x)(version>=2.0.0))")
                    .import_package("(&(osgi.wiring.package=com.x)(bundle-symbolic-name=b))")
                    .import_package("(&(osgi.wiring.package=com.x)(bundle-symbolic-name=c))"),
            )
            .unwrap();

        let results: Vec<bool> = repo
            .requirements(consumer, None)
            .map(|r| {
                RequirementSpec::from_requirement(&repo, r)
                    .unwrap()
                    .matches(repo.capability(cap))
            })
            .collect();
        assert_eq!(results, vec![true, false, true, false]);
    }

    #[test]
    fn test_requirement_without_name_is_invalid() {
        let (repo, id) =
            repo_with(ResourceDef::bundle("a", Version::new(1, 0, 0)).require_bundle("(bundle-version=1.0)"));
        let req = repo.requirements(id, None).next().unwrap();
        let err = RequirementSpec::from_requirement(&repo, req).unwrap_err();
        assert!(matches!(err, ResolverError::InvalidAttribute(_)));
    }

    #[test]
    fn test_parse_error_propagates() {
        let (repo, id) = repo_with(ResourceDef::bundle("a", Version::new(1, 0, 0)).import_package("(broken"));
        let req = repo.requirements(id, None).next().unwrap();
        let err = RequirementSpec::from_requirement(&repo, req).unwrap_err();
        assert!(matches!(err, ResolverError::Parse(_)));
    }
}
