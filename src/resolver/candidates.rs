//! Candidate capabilities per requirement
//!
//! A [`Candidates`] value is one permutation of the search: every requirement
//! of every indexed resource mapped to its ordered candidate list. The first
//! entry of a single-cardinality list is the selected provider.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::state::ResolveState;
use crate::environment::EnvironmentAdapter;
use crate::model::{CapabilityId, Namespace, Repository, RequirementId, ResourceId};

/// Whether `provider` may satisfy a requirement of `requirer` in `namespace`
///
/// Requirers with a snapshot entry are restricted to the providers recorded
/// there; everyone else is restricted to what the environment makes visible.
pub fn filter_matches(
    adapter: &EnvironmentAdapter<'_>,
    requirer: ResourceId,
    namespace: &Namespace,
    capability: CapabilityId,
    visible: &BTreeSet<CapabilityId>,
) -> bool {
    match adapter.pinned_providers(requirer, namespace) {
        Some(providers) => providers.contains(&adapter.repository().capability(capability).resource()),
        None => visible.contains(&capability),
    }
}

/// One candidate permutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Candidates {
    lists: BTreeMap<RequirementId, Vec<CapabilityId>>,
}

impl Candidates {
    /// Compute the candidates of every requirement of every indexed resource
    pub fn populate(state: &ResolveState, adapter: &EnvironmentAdapter<'_>) -> Self {
        let repository = adapter.repository();
        let mut lists = BTreeMap::new();

        for &resource in state.indexed() {
            let Some(description) = adapter.description(resource) else {
                continue;
            };
            for requirement in &description.requirements {
                let visible: BTreeSet<CapabilityId> = if state.is_pinned(resource) {
                    BTreeSet::new()
                } else {
                    adapter.find_providers(requirement.id).into_iter().collect()
                };

                let mut caps: Vec<CapabilityId> = state
                    .store()
                    .in_namespace(&requirement.namespace)
                    .filter(|cap| requirement.spec.matches(repository.capability(*cap)))
                    .filter(|cap| filter_matches(adapter, resource, &requirement.namespace, *cap, &visible))
                    .collect();
                caps.sort_by(|a, b| Self::preference(state, adapter, *a, *b));

                debug!(
                    "{} candidate(s) for {} of {}",
                    caps.len(),
                    repository.requirement(requirement.id).describe(),
                    repository.identity(resource)
                );
                lists.insert(requirement.id, caps);
            }
        }

        Self { lists }
    }

    fn preference(state: &ResolveState, adapter: &EnvironmentAdapter<'_>, a: CapabilityId, b: CapabilityId) -> Ordering {
        let repository = adapter.repository();
        let pinned_a = state.is_pinned(repository.capability(a).resource());
        let pinned_b = state.is_pinned(repository.capability(b).resource());
        pinned_b
            .cmp(&pinned_a)
            .then_with(|| adapter.compare_candidates(a, b))
    }

    /// Ordered candidates of a requirement
    pub fn get(&self, requirement: RequirementId) -> &[CapabilityId] {
        self.lists.get(&requirement).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Capabilities a requirement is wired to: the first candidate, or all
    /// of them for multiple cardinality
    pub fn selected(&self, repository: &Repository, requirement: RequirementId) -> &[CapabilityId] {
        let caps = self.get(requirement);
        let limit = repository.requirement(requirement).cardinality().min(caps.len());
        &caps[..limit]
    }

    /// Drop candidates whose provider is not in `viable`
    pub fn reduce(&self, repository: &Repository, viable: &BTreeSet<ResourceId>) -> Self {
        let lists = self
            .lists
            .iter()
            .map(|(req, caps)| {
                let kept = caps
                    .iter()
                    .copied()
                    .filter(|cap| viable.contains(&repository.capability(*cap).resource()))
                    .collect();
                (*req, kept)
            })
            .collect();
        Self { lists }
    }

    /// Copy of this permutation with the selected candidate of `requirement`
    /// removed
    ///
    /// `None` for multiple-cardinality requirements and empty lists, which
    /// have no single choice to revisit.
    pub fn without_selected(&self, repository: &Repository, requirement: RequirementId) -> Option<Self> {
        if repository.requirement(requirement).cardinality() != 1 {
            return None;
        }
        let caps = self.lists.get(&requirement)?;
        if caps.is_empty() {
            return None;
        }
        let mut next = self.clone();
        if let Some(list) = next.lists.get_mut(&requirement) {
            list.remove(0);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RepositoryEnvironment;
    use crate::model::{ResourceDef, Version};

    fn setup() -> (Repository, ResourceId, ResourceId, ResourceId) {
        let mut repo = Repository::new();
        let a = repo
            .add(ResourceDef::bundle("a", Version::new(1, 0, 0)).import_package("(osgi.wiring.package=p)"))
            .unwrap();
        let old = repo
            .add(ResourceDef::bundle("old", Version::new(1, 0, 0)).export_package("p", Version::new(1, 0, 0), &[]))
            .unwrap();
        let new = repo
            .add(ResourceDef::bundle("new", Version::new(1, 0, 0)).export_package("p", Version::new(2, 0, 0), &[]))
            .unwrap();
        (repo, a, old, new)
    }

    #[test]
    fn test_populate_orders_by_version() {
        let (repo, a, old, new) = setup();
        let env = RepositoryEnvironment::new();
        let mut adapter = EnvironmentAdapter::new(&repo, &env);
        let mut state = ResolveState::new();
        state.index(&mut adapter, a).unwrap();
        state.close(&mut adapter).unwrap();

        let candidates = Candidates::populate(&state, &adapter);
        let req = repo.requirements(a, None).next().unwrap();
        let providers: Vec<_> = candidates
            .get(req)
            .iter()
            .map(|c| repo.capability(*c).resource())
            .collect();
        assert_eq!(providers, vec![new, old]);
        assert_eq!(candidates.selected(&repo, req).len(), 1);

        let next = candidates.without_selected(&repo, req).unwrap();
        assert_eq!(repo.capability(next.get(req)[0]).resource(), old);
        assert_ne!(next, candidates);

        let reduced = candidates.reduce(&repo, &[a, old].into_iter().collect());
        assert_eq!(reduced.get(req).len(), 1);
    }

    #[test]
    fn test_hidden_provider_is_not_a_candidate() {
        let (repo, a, old, new) = setup();
        let env = RepositoryEnvironment::new().hidden(new);
        let mut adapter = EnvironmentAdapter::new(&repo, &env);
        let mut state = ResolveState::new();
        state.index(&mut adapter, a).unwrap();
        state.close(&mut adapter).unwrap();

        let candidates = Candidates::populate(&state, &adapter);
        let req = repo.requirements(a, None).next().unwrap();
        assert_eq!(candidates.get(req).len(), 1);
        assert_eq!(repo.capability(candidates.get(req)[0]).resource(), old);
    }
}
