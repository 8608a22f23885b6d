//! Constraint solving over the scratch index
//!
//! Elimination computes the greatest set of resources whose mandatory
//! requirements all have a candidate from a member of the set, with at most
//! one member per singleton name. When the policy's singleton choice costs a
//! root its viability, other winners are searched for first. Uses
//! constraints are then checked on the selected candidates; a conflict is
//! repaired by breadth-first search over permutations that revisit the
//! blamed selections.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::{debug, warn};

use super::candidates::Candidates;
use super::singleton::SingletonGroups;
use super::state::ResolveState;
use super::uses::{Conflict, UsesChecker};
use crate::config::ResolverConfig;
use crate::environment::EnvironmentAdapter;
use crate::error::FailureReason;
use crate::model::ResourceId;

/// Outcome of one solve
#[derive(Debug, Clone)]
pub struct Solution {
    pub resolved: BTreeSet<ResourceId>,
    pub failures: BTreeMap<ResourceId, FailureReason>,
    pub candidates: Candidates,
}

impl Solution {
    pub fn is_resolved(&self, resource: ResourceId) -> bool {
        self.resolved.contains(&resource)
    }
}

/// Outcome of one elimination pass
struct Elimination {
    viable: BTreeSet<ResourceId>,
    failures: BTreeMap<ResourceId, FailureReason>,
    /// Unpinned singleton winners that beat a viable member
    contested: Vec<ResourceId>,
}

pub struct Solver<'s, 'a> {
    state: &'s ResolveState,
    adapter: &'s EnvironmentAdapter<'a>,
    config: &'s ResolverConfig,
    singletons: SingletonGroups,
}

impl<'s, 'a> Solver<'s, 'a> {
    pub fn new(state: &'s ResolveState, adapter: &'s EnvironmentAdapter<'a>, config: &'s ResolverConfig) -> Self {
        let singletons = SingletonGroups::new(adapter.repository(), state.indexed());
        Self {
            state,
            adapter,
            config,
            singletons,
        }
    }

    /// Solve for every indexed resource
    ///
    /// `roots` are the resources whose viability a uses repair must not give
    /// up.
    pub fn solve(&self, roots: &BTreeSet<ResourceId>) -> Solution {
        let repository = self.adapter.repository();
        let base = Candidates::populate(self.state, self.adapter);
        let mut excluded: BTreeMap<ResourceId, FailureReason> = BTreeMap::new();
        let wanted: BTreeSet<ResourceId> = roots.iter().chain(self.state.pinned()).copied().collect();

        loop {
            let banned = self.singleton_bans(&base, &excluded, &wanted);
            let Elimination { viable, failures, .. } = self.eliminate(&base, &excluded, &banned);
            let protected: BTreeSet<ResourceId> = wanted.intersection(&viable).copied().collect();

            match self.search(base.reduce(repository, &viable), &excluded, &banned, &protected) {
                Ok(solution) => {
                    debug!(
                        "Solved: {} resolved, {} failed",
                        solution.resolved.len(),
                        solution.failures.len()
                    );
                    return solution;
                }
                Err(Some(conflict)) => {
                    warn!(
                        "No permutation satisfies uses constraints of {} on package {}",
                        repository.identity(conflict.resource),
                        conflict.package
                    );
                    excluded.insert(
                        conflict.resource,
                        FailureReason::UsesConflict {
                            package: conflict.package,
                        },
                    );
                }
                Err(None) => {
                    return Solution {
                        candidates: base.reduce(repository, &viable),
                        resolved: viable,
                        failures,
                    };
                }
            }
        }
    }

    /// Singleton winners to pass over so that the most of `wanted` stays
    /// viable
    ///
    /// Breadth-first over sets of banned winners, bounded by
    /// `max_permutations`. The empty set, i.e. the plain policy choice, is
    /// kept unless a ban set does strictly better.
    fn singleton_bans(
        &self,
        candidates: &Candidates,
        excluded: &BTreeMap<ResourceId, FailureReason>,
        wanted: &BTreeSet<ResourceId>,
    ) -> BTreeSet<ResourceId> {
        let mut best = BTreeSet::new();
        if self.singletons.is_empty() {
            return best;
        }
        let score = |outcome: &Elimination| wanted.iter().filter(|r| outcome.viable.contains(r)).count();

        let initial = self.eliminate(candidates, excluded, &best);
        let mut best_score = score(&initial);
        if best_score == wanted.len() {
            return best;
        }

        let mut queue = VecDeque::from([(best.clone(), initial)]);
        let mut seen = HashSet::from([best.clone()]);
        let mut explored = 0usize;
        while let Some((banned, outcome)) = queue.pop_front() {
            for winner in &outcome.contested {
                if explored >= self.config.max_permutations {
                    debug!("Singleton search limit {} reached", self.config.max_permutations);
                    return best;
                }
                let mut next = banned.clone();
                next.insert(*winner);
                if !seen.insert(next.clone()) {
                    continue;
                }
                explored += 1;

                let result = self.eliminate(candidates, excluded, &next);
                let next_score = score(&result);
                if next_score > best_score {
                    debug!(
                        "Passing over singleton(s) {:?} keeps {} of {} required resource(s)",
                        next, next_score, wanted.len()
                    );
                    best_score = next_score;
                    best = next.clone();
                    if best_score == wanted.len() {
                        return best;
                    }
                }
                queue.push_back((next, result));
            }
        }
        best
    }

    /// Breadth-first permutation search
    ///
    /// The initial permutation is always checked. `Err` carries the first
    /// conflict met when the search is exhausted.
    fn search(
        &self,
        initial: Candidates,
        excluded: &BTreeMap<ResourceId, FailureReason>,
        banned: &BTreeSet<ResourceId>,
        protected: &BTreeSet<ResourceId>,
    ) -> Result<Solution, Option<Conflict>> {
        let repository = self.adapter.repository();
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        let mut first_conflict = None;
        let mut explored = 0usize;

        seen.insert(initial.clone());
        queue.push_back(initial);

        while let Some(permutation) = queue.pop_front() {
            if explored >= self.config.max_permutations.max(1) {
                debug!("Permutation limit {} reached", self.config.max_permutations);
                break;
            }
            explored += 1;

            let Elimination { viable, failures, .. } = self.eliminate(&permutation, excluded, banned);
            if !protected.is_subset(&viable) {
                continue;
            }
            let permutation = permutation.reduce(repository, &viable);

            let checker = UsesChecker::new(self.adapter, &permutation, &viable, self.state.pinned());
            match checker.check() {
                None => {
                    debug!("Consistent permutation found after {} attempt(s)", explored);
                    return Ok(Solution {
                        resolved: viable,
                        failures,
                        candidates: permutation,
                    });
                }
                Some(conflict) => {
                    for next in conflict.permutations(repository, &permutation) {
                        if seen.insert(next.clone()) {
                            queue.push_back(next);
                        }
                    }
                    first_conflict.get_or_insert(conflict);
                }
            }
        }
        Err(first_conflict)
    }

    /// Greatest fixed point of viability under `candidates`
    fn eliminate(
        &self,
        candidates: &Candidates,
        excluded: &BTreeMap<ResourceId, FailureReason>,
        banned: &BTreeSet<ResourceId>,
    ) -> Elimination {
        let repository = self.adapter.repository();
        let mut dead = excluded.clone();

        loop {
            let mut failures = dead.clone();
            let mut viable: BTreeSet<ResourceId> = self
                .state
                .indexed()
                .iter()
                .copied()
                .filter(|r| !dead.contains_key(r))
                .collect();

            let selections = self.singletons.select(
                repository,
                self.state.pinned(),
                &viable,
                banned,
                self.config.singleton_policy,
            );
            for (winner, losers) in &selections {
                for loser in losers {
                    viable.remove(loser);
                    failures.insert(*loser, FailureReason::SingletonCollision { selected: *winner });
                }
            }

            let mut changed = true;
            while changed {
                changed = false;
                let current: Vec<ResourceId> = viable.iter().copied().collect();
                for resource in current {
                    if let Some(reason) = self.missing_requirement(candidates, &viable, resource) {
                        viable.remove(&resource);
                        failures.insert(resource, reason);
                        changed = true;
                    }
                }
            }

            let fallen: Vec<ResourceId> = selections
                .iter()
                .map(|(winner, _)| *winner)
                .filter(|w| !viable.contains(w))
                .collect();
            if fallen.is_empty() {
                let contested = selections
                    .iter()
                    .filter(|(winner, losers)| !losers.is_empty() && !self.state.is_pinned(*winner))
                    .map(|(winner, _)| *winner)
                    .collect();
                return Elimination {
                    viable,
                    failures,
                    contested,
                };
            }
            for winner in fallen {
                if let Some(reason) = failures.get(&winner) {
                    dead.insert(winner, reason.clone());
                }
            }
        }
    }

    /// First mandatory requirement of `resource` without a viable candidate
    fn missing_requirement(
        &self,
        candidates: &Candidates,
        viable: &BTreeSet<ResourceId>,
        resource: ResourceId,
    ) -> Option<FailureReason> {
        let repository = self.adapter.repository();
        let description = self.adapter.description(resource)?;
        description
            .requirements
            .iter()
            .filter(|r| r.is_mandatory())
            .find(|r| {
                !candidates
                    .get(r.id)
                    .iter()
                    .any(|cap| viable.contains(&repository.capability(*cap).resource()))
            })
            .map(|r| FailureReason::MissingRequirement {
                requirement: r.id,
                description: repository.requirement(r.id).describe(),
            })
    }
}
