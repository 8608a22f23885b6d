//! Environment adapter
//!
//! Translates repository resources into the descriptions the engine solves
//! over, and answers questions about the pre-existing wiring snapshot.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use super::Environment;
use crate::error::ResolverError;
use crate::model::{CapabilityId, Namespace, Repository, RequirementId, ResourceId, Wiring};
use crate::resolver::description::{Description, RequirementDescription, RequirementSpec};

/// Per-call view of the environment
pub struct EnvironmentAdapter<'a> {
    repository: &'a Repository,
    environment: &'a dyn Environment,
    descriptions: BTreeMap<ResourceId, Arc<Description>>,
}

impl<'a> EnvironmentAdapter<'a> {
    pub fn new(repository: &'a Repository, environment: &'a dyn Environment) -> Self {
        Self {
            repository,
            environment,
            descriptions: BTreeMap::new(),
        }
    }

    pub fn repository(&self) -> &'a Repository {
        self.repository
    }

    /// The pre-existing wiring
    pub fn snapshot(&self) -> &'a Wiring {
        self.environment.wiring()
    }

    pub fn is_pinned(&self, resource: ResourceId) -> bool {
        self.snapshot().contains(resource)
    }

    /// Materialize the internal description of `resource`
    ///
    /// Requirement filters are parsed here; syntax errors propagate.
    pub fn describe(&mut self, resource: ResourceId) -> Result<Arc<Description>, ResolverError> {
        if let Some(description) = self.descriptions.get(&resource) {
            return Ok(Arc::clone(description));
        }

        let repository = self.repository;
        let mut requirements = Vec::new();
        for id in repository.requirements(resource, None) {
            if !self.environment.is_effective(repository, id) {
                debug!(
                    "Skipping ineffective requirement {} of {}",
                    repository.requirement(id).describe(),
                    repository.identity(resource)
                );
                continue;
            }
            let requirement = repository.requirement(id);
            requirements.push(RequirementDescription {
                id,
                namespace: requirement.namespace().clone(),
                spec: RequirementSpec::from_requirement(repository, id)?,
                optional: requirement.is_optional(),
                cardinality: requirement.cardinality(),
                reexport: requirement.is_reexport(),
            });
        }

        let mut exports = BTreeMap::new();
        for cap in repository.capabilities(resource, Some(&Namespace::Package)) {
            if let Some(name) = repository.capability(cap).name() {
                exports.entry(name.to_string()).or_insert(cap);
            }
        }

        let description = Arc::new(Description {
            resource,
            requirements,
            exports,
        });
        self.descriptions.insert(resource, Arc::clone(&description));
        Ok(description)
    }

    /// Previously materialized description
    pub fn description(&self, resource: ResourceId) -> Option<&Arc<Description>> {
        self.descriptions.get(&resource)
    }

    pub fn find_providers(&self, requirement: RequirementId) -> Vec<CapabilityId> {
        self.environment.find_providers(self.repository, requirement)
    }

    pub fn compare_candidates(&self, a: CapabilityId, b: CapabilityId) -> Ordering {
        self.environment.compare_candidates(self.repository, a, b)
    }

    /// Providers a pinned requirer may wire to in `namespace`
    ///
    /// `None` when `requirer` has no snapshot entry, i.e. is unrestricted.
    /// Fragments also see the providers recorded for their hosts.
    pub fn pinned_providers(&self, requirer: ResourceId, namespace: &Namespace) -> Option<BTreeSet<ResourceId>> {
        let snapshot = self.snapshot();
        if !snapshot.contains(requirer) {
            return None;
        }

        let repository = self.repository;
        let mut providers = snapshot.providers_in(repository, requirer, namespace);
        if repository.resource(requirer).is_fragment() && *namespace != Namespace::Host {
            for host in snapshot.providers_in(repository, requirer, &Namespace::Host) {
                providers.extend(snapshot.providers_in(repository, host, namespace));
            }
        }
        Some(providers)
    }
}
