//! Singleton selection
//!
//! At most one resource of a singleton symbolic name may resolve. A pinned
//! resource always keeps its place; otherwise the configured policy picks
//! among the members the solver has not banned from winning.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::SingletonPolicy;
use crate::model::{Repository, ResourceId};

/// Indexed singleton resources grouped by symbolic name
#[derive(Debug, Default)]
pub struct SingletonGroups {
    groups: BTreeMap<String, Vec<ResourceId>>,
}

impl SingletonGroups {
    pub fn new(repository: &Repository, indexed: &BTreeSet<ResourceId>) -> Self {
        let mut groups: BTreeMap<String, Vec<ResourceId>> = BTreeMap::new();
        for &resource in indexed {
            let identity = repository.identity(resource);
            if identity.singleton {
                groups.entry(identity.name.clone()).or_default().push(resource);
            }
        }
        groups.retain(|_, members| members.len() > 1);
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Pick one winner per group among the `viable` members
    ///
    /// Members in `banned` only win when every viable member of their group
    /// is banned. Returns `(winner, loser)` pairs; groups with no viable
    /// member are skipped.
    pub fn select(
        &self,
        repository: &Repository,
        pinned: &BTreeSet<ResourceId>,
        viable: &BTreeSet<ResourceId>,
        banned: &BTreeSet<ResourceId>,
        policy: SingletonPolicy,
    ) -> Vec<(ResourceId, Vec<ResourceId>)> {
        let mut selections = Vec::new();
        for members in self.groups.values() {
            let alive: Vec<ResourceId> = members.iter().copied().filter(|r| viable.contains(r)).collect();
            let eligible: Vec<ResourceId> = alive.iter().copied().filter(|r| !banned.contains(r)).collect();
            let winner = alive
                .iter()
                .copied()
                .find(|r| pinned.contains(r))
                .or_else(|| Self::choose(repository, &eligible, policy))
                .or_else(|| Self::choose(repository, &alive, policy));
            if let Some(winner) = winner {
                let losers = alive.into_iter().filter(|r| *r != winner).collect();
                selections.push((winner, losers));
            }
        }
        selections
    }

    fn choose(repository: &Repository, alive: &[ResourceId], policy: SingletonPolicy) -> Option<ResourceId> {
        match policy {
            SingletonPolicy::FirstRegistered => alive.iter().copied().min(),
            SingletonPolicy::HighestVersion => alive.iter().copied().max_by(|a, b| {
                repository
                    .identity(*a)
                    .version
                    .cmp(&repository.identity(*b).version)
                    .then_with(|| b.cmp(a))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceDef, Version};

    #[test]
    fn test_policies() {
        let mut repo = Repository::new();
        let v1 = repo.add(ResourceDef::bundle("s", Version::new(1, 0, 0)).singleton()).unwrap();
        let v2 = repo.add(ResourceDef::bundle("s", Version::new(2, 0, 0)).singleton()).unwrap();
        let plain = repo.add(ResourceDef::bundle("t", Version::new(1, 0, 0))).unwrap();
        let all: BTreeSet<_> = [v1, v2, plain].into_iter().collect();

        let groups = SingletonGroups::new(&repo, &all);
        let none = BTreeSet::new();

        let highest = groups.select(&repo, &none, &all, &none, SingletonPolicy::HighestVersion);
        assert_eq!(highest, vec![(v2, vec![v1])]);

        let first = groups.select(&repo, &none, &all, &none, SingletonPolicy::FirstRegistered);
        assert_eq!(first, vec![(v1, vec![v2])]);

        let pinned: BTreeSet<_> = [v1].into_iter().collect();
        let kept = groups.select(&repo, &pinned, &all, &none, SingletonPolicy::HighestVersion);
        assert_eq!(kept, vec![(v1, vec![v2])]);

        let only_v1: BTreeSet<_> = [v1].into_iter().collect();
        let fallback = groups.select(&repo, &none, &only_v1, &none, SingletonPolicy::HighestVersion);
        assert_eq!(fallback, vec![(v1, vec![])]);
    }

    #[test]
    fn test_banned_members_yield() {
        let mut repo = Repository::new();
        let v1 = repo.add(ResourceDef::bundle("s", Version::new(1, 0, 0)).singleton()).unwrap();
        let v2 = repo.add(ResourceDef::bundle("s", Version::new(2, 0, 0)).singleton()).unwrap();
        let all: BTreeSet<_> = [v1, v2].into_iter().collect();
        let groups = SingletonGroups::new(&repo, &all);
        let none = BTreeSet::new();

        let ban_v2: BTreeSet<_> = [v2].into_iter().collect();
        let yielded = groups.select(&repo, &none, &all, &ban_v2, SingletonPolicy::HighestVersion);
        assert_eq!(yielded, vec![(v1, vec![v2])]);

        // still exactly one winner when every member is banned
        let everyone = groups.select(&repo, &none, &all, &all, SingletonPolicy::HighestVersion);
        assert_eq!(everyone, vec![(v2, vec![v1])]);

        // pinned members ignore bans
        let pinned: BTreeSet<_> = [v2].into_iter().collect();
        let kept = groups.select(&repo, &pinned, &all, &ban_v2, SingletonPolicy::HighestVersion);
        assert_eq!(kept, vec![(v2, vec![v1])]);
    }
}
