//! In-memory environment backed by a repository

use std::collections::BTreeSet;

use super::Environment;
use crate::model::{CapabilityId, Repository, RequirementId, ResourceId, Wiring};

/// Environment exposing every repository capability of the requirement's
/// namespace, minus hidden resources
#[derive(Debug, Clone, Default)]
pub struct RepositoryEnvironment {
    wiring: Wiring,
    hidden: BTreeSet<ResourceId>,
}

impl RepositoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `wiring` as the already-resolved state
    pub fn with_wiring(mut self, wiring: Wiring) -> Self {
        self.wiring = wiring;
        self
    }

    /// Make a resource invisible as a provider
    pub fn hide(&mut self, resource: ResourceId) {
        self.hidden.insert(resource);
    }

    pub fn hidden(mut self, resource: ResourceId) -> Self {
        self.hide(resource);
        self
    }

    pub fn set_wiring(&mut self, wiring: Wiring) {
        self.wiring = wiring;
    }
}

impl Environment for RepositoryEnvironment {
    fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    fn find_providers(&self, repository: &Repository, requirement: RequirementId) -> Vec<CapabilityId> {
        let namespace = repository.requirement(requirement).namespace();
        repository
            .capabilities_in(namespace)
            .filter(|c| !self.hidden.contains(&repository.capability(*c).resource()))
            .collect()
    }
}
