//! Per-call scratch index
//!
//! Resources enter the index once, their capabilities are filed into a
//! namespace-keyed store, and newly indexed resources are queued on a
//! frontier. [`ResolveState::close`] drains the frontier until a pass
//! discovers nothing new.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use crate::environment::EnvironmentAdapter;
use crate::error::ResolverError;
use crate::model::{CapabilityId, Namespace, ResourceId};

/// Capabilities of indexed resources, grouped by namespace
#[derive(Debug, Default)]
pub struct CapabilityStore {
    by_namespace: BTreeMap<Namespace, BTreeSet<CapabilityId>>,
}

impl CapabilityStore {
    pub fn insert(&mut self, namespace: &Namespace, capability: CapabilityId) {
        self.by_namespace
            .entry(namespace.clone())
            .or_default()
            .insert(capability);
    }

    pub fn in_namespace(&self, namespace: &Namespace) -> impl Iterator<Item = CapabilityId> + '_ {
        self.by_namespace.get(namespace).into_iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.by_namespace.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_namespace.is_empty()
    }
}

/// Scratch index for one `resolve()` call
#[derive(Debug, Default)]
pub struct ResolveState {
    indexed: BTreeSet<ResourceId>,
    pinned: BTreeSet<ResourceId>,
    store: CapabilityStore,
    frontier: VecDeque<ResourceId>,
}

impl ResolveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the index; `false` if it was already there
    pub fn index(&mut self, adapter: &mut EnvironmentAdapter<'_>, resource: ResourceId) -> Result<bool, ResolverError> {
        if self.indexed.contains(&resource) {
            return Ok(false);
        }
        adapter.describe(resource)?;

        let repository = adapter.repository();
        for cap in repository.capabilities(resource, None) {
            self.store.insert(repository.capability(cap).namespace(), cap);
        }
        if adapter.is_pinned(resource) {
            self.pinned.insert(resource);
        }
        self.indexed.insert(resource);
        self.frontier.push_back(resource);
        Ok(true)
    }

    /// Index every provider reachable from the frontier
    ///
    /// Unpinned requirers discover providers through the environment; pinned
    /// requirers only through the providers recorded in the snapshot.
    pub fn close(&mut self, adapter: &mut EnvironmentAdapter<'_>) -> Result<(), ResolverError> {
        let repository = adapter.repository();
        let mut passes = 0usize;
        while let Some(resource) = self.frontier.pop_front() {
            passes += 1;
            let Some(description) = adapter.description(resource).cloned() else {
                continue;
            };

            let mut discovered = Vec::new();
            for requirement in &description.requirements {
                match adapter.pinned_providers(resource, &requirement.namespace) {
                    Some(providers) => discovered.extend(providers),
                    None => discovered.extend(
                        adapter
                            .find_providers(requirement.id)
                            .into_iter()
                            .filter(|cap| requirement.spec.matches(repository.capability(*cap)))
                            .map(|cap| repository.capability(cap).resource()),
                    ),
                }
            }

            for provider in discovered {
                if self.index(adapter, provider)? {
                    debug!(
                        "Indexed provider {} discovered from {}",
                        repository.identity(provider),
                        repository.identity(resource)
                    );
                }
            }
        }
        debug!("Index closed after {} passes, {} resources", passes, self.indexed.len());
        Ok(())
    }

    pub fn indexed(&self) -> &BTreeSet<ResourceId> {
        &self.indexed
    }

    pub fn pinned(&self) -> &BTreeSet<ResourceId> {
        &self.pinned
    }

    pub fn is_pinned(&self, resource: ResourceId) -> bool {
        self.pinned.contains(&resource)
    }

    pub fn store(&self) -> &CapabilityStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RepositoryEnvironment;
    use crate::model::{Repository, ResourceDef, Version};

    #[test]
    fn test_close_follows_transitive_providers() {
        let mut repo = Repository::new();
        let a = repo
            .add(ResourceDef::bundle("a", Version::new(1, 0, 0)).require_bundle("(osgi.wiring.bundle=b)"))
            .unwrap();
        let b = repo
            .add(ResourceDef::bundle("b", Version::new(1, 0, 0)).import_package("(osgi.wiring.package=p)"))
            .unwrap();
        let c = repo
            .add(ResourceDef::bundle("c", Version::new(1, 0, 0)).export_package("p", Version::new(1, 0, 0), &[]))
            .unwrap();
        let unrelated = repo.add(ResourceDef::bundle("d", Version::new(1, 0, 0))).unwrap();

        let env = RepositoryEnvironment::new();
        let mut adapter = EnvironmentAdapter::new(&repo, &env);
        let mut state = ResolveState::new();
        assert!(state.index(&mut adapter, a).unwrap());
        assert!(!state.index(&mut adapter, a).unwrap());
        state.close(&mut adapter).unwrap();

        assert!(state.indexed().contains(&b));
        assert!(state.indexed().contains(&c));
        assert!(!state.indexed().contains(&unrelated));
        assert_eq!(state.store().in_namespace(&Namespace::Package).count(), 1);
        assert!(state.pinned().is_empty());
    }
}
