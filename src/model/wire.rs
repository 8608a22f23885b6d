//! Wires and wirings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::namespace::Namespace;
use super::resource::{CapabilityId, Repository, RequirementId, ResourceId};
use crate::error::ResolverError;

/// A resolved edge from a requirement to the capability satisfying it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Wire {
    pub requirer: ResourceId,
    pub requirement: RequirementId,
    pub provider: ResourceId,
    pub capability: CapabilityId,
}

impl Wire {
    /// Build a wire, checking that both ends share a namespace
    pub fn new(
        repository: &Repository,
        requirement: RequirementId,
        capability: CapabilityId,
    ) -> Result<Self, ResolverError> {
        let req = repository.requirement(requirement);
        let cap = repository.capability(capability);
        if req.namespace() != cap.namespace() {
            return Err(ResolverError::InvalidAttribute(format!(
                "cannot wire {} requirement to {} capability",
                req.namespace(),
                cap.namespace()
            )));
        }
        Ok(Self {
            requirer: req.resource(),
            requirement,
            provider: cap.resource(),
            capability,
        })
    }
}

/// Resource to ordered wires
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wiring {
    entries: BTreeMap<ResourceId, Vec<Wire>>,
}

impl Wiring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the wires of a resource, replacing any previous entry
    pub fn insert(&mut self, resource: ResourceId, wires: Vec<Wire>) {
        self.entries.insert(resource, wires);
    }

    pub fn get(&self, resource: ResourceId) -> Option<&[Wire]> {
        self.entries.get(&resource).map(Vec::as_slice)
    }

    pub fn contains(&self, resource: ResourceId) -> bool {
        self.entries.contains_key(&resource)
    }

    pub fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &[Wire])> {
        self.entries.iter().map(|(r, w)| (*r, w.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wires of `resource` whose requirement is in `namespace`
    pub fn wires_in<'a>(
        &'a self,
        repository: &'a Repository,
        resource: ResourceId,
        namespace: &'a Namespace,
    ) -> impl Iterator<Item = &'a Wire> + 'a {
        self.entries
            .get(&resource)
            .into_iter()
            .flatten()
            .filter(move |w| repository.capability(w.capability).namespace() == namespace)
    }

    /// Providers `resource` is wired to in `namespace`
    pub fn providers_in(
        &self,
        repository: &Repository,
        resource: ResourceId,
        namespace: &Namespace,
    ) -> BTreeSet<ResourceId> {
        self.wires_in(repository, resource, namespace)
            .map(|w| w.provider)
            .collect()
    }

    /// Merge another wiring into this one; entries in `other` win
    pub fn extend(&mut self, other: Wiring) {
        self.entries.extend(other.entries);
    }
}
