//! Resolution engine
//!
//! [`Resolver::resolve`] runs four steps over a private scratch index:
//!
//! 1. **Seed**: resources of the environment's wiring snapshot are indexed
//!    and pinned; they must still resolve on their own.
//! 2. **Load**: the mandatory and optional resources are indexed and the
//!    index is closed over every provider the environment makes visible.
//! 3. **Solve**: elimination, singleton selection and uses-constraint repair
//!    (see [`solver`]).
//! 4. **Harvest**: all mandatory resources resolved or the call fails; the
//!    resolved optional resources are added with their dependencies.

pub mod candidates;
pub mod description;
pub mod harvest;
pub mod singleton;
pub mod solver;
pub mod state;
pub mod uses;

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::environment::{Environment, EnvironmentAdapter};
use crate::error::{ResolutionFailure, ResolverError, UnresolvedResource};
use crate::model::{Repository, ResourceId, Wiring};

use solver::Solver;
use state::ResolveState;

pub use solver::Solution;

/// Resolver
///
/// Holds configuration only; every call builds its own state, so a single
/// resolver can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `mandatory` and `optional` resources against `environment`
    ///
    /// Returns the wiring of every mandatory resource plus each optional
    /// resource that resolved, together with the unpinned resources they
    /// depend on. Fails with [`ResolverError::Resolution`] if any mandatory
    /// resource is left unresolved; no wiring is returned in that case.
    ///
    /// # Panics
    ///
    /// If a resource of the environment's wiring snapshot no longer
    /// resolves, the snapshot is inconsistent with the repository.
    pub fn resolve(
        &self,
        repository: &Repository,
        mandatory: &[ResourceId],
        optional: &[ResourceId],
        environment: &dyn Environment,
    ) -> Result<Wiring, ResolverError> {
        let mandatory = Self::dedup(repository, mandatory)?;
        let optional = Self::dedup(repository, optional)?;
        info!(
            "Resolving {} mandatory and {} optional resource(s)",
            mandatory.len(),
            optional.len()
        );

        let mut adapter = EnvironmentAdapter::new(repository, environment);
        let mut state = ResolveState::new();

        let snapshot = Self::dedup(repository, &adapter.snapshot().resources().collect::<Vec<_>>())?;
        if !snapshot.is_empty() {
            self.seed(&mut state, &mut adapter, &snapshot)?;
        }

        for resource in mandatory.iter().chain(&optional) {
            state.index(&mut adapter, *resource)?;
        }
        state.close(&mut adapter)?;

        let roots: BTreeSet<ResourceId> = mandatory.iter().copied().collect();
        let solution = Solver::new(&state, &adapter, &self.config).solve(&roots);

        let unresolved: Vec<UnresolvedResource> = mandatory
            .iter()
            .filter_map(|resource| {
                solution.failures.get(resource).map(|reason| UnresolvedResource {
                    resource: *resource,
                    identity: repository.identity(*resource).to_string(),
                    reason: reason.clone(),
                })
            })
            .collect();
        if !unresolved.is_empty() {
            let failure = ResolutionFailure { unresolved };
            warn!("{}", failure);
            return Err(ResolverError::Resolution(failure));
        }

        let mut wiring = Wiring::new();
        for resource in mandatory.iter().chain(&optional) {
            if solution.is_resolved(*resource) {
                harvest::harvest(&adapter, &solution, *resource, &mut wiring)?;
            } else if let Some(reason) = solution.failures.get(resource) {
                debug!(
                    "Dropping optional resource {}: {}",
                    repository.identity(*resource),
                    reason
                );
            }
        }

        info!("Resolution complete: {} resource(s) wired", wiring.len());
        Ok(wiring)
    }

    fn seed(
        &self,
        state: &mut ResolveState,
        adapter: &mut EnvironmentAdapter<'_>,
        snapshot: &[ResourceId],
    ) -> Result<(), ResolverError> {
        debug!("Seeding {} pre-resolved resource(s)", snapshot.len());
        for resource in snapshot {
            state.index(adapter, *resource)?;
        }
        state.close(adapter)?;

        let roots: BTreeSet<ResourceId> = snapshot.iter().copied().collect();
        let solution = Solver::new(state, adapter, &self.config).solve(&roots);
        let broken: Vec<String> = snapshot
            .iter()
            .filter(|r| !solution.is_resolved(**r))
            .map(|r| adapter.repository().identity(*r).to_string())
            .collect();
        assert!(
            broken.is_empty(),
            "pre-resolved resources no longer resolve: {}",
            broken.join(", ")
        );
        Ok(())
    }

    /// Resources in first-seen order, checked against the repository
    fn dedup(repository: &Repository, resources: &[ResourceId]) -> Result<Vec<ResourceId>, ResolverError> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(resources.len());
        for resource in resources {
            if resource.index() >= repository.len() {
                return Err(ResolverError::InvalidResource(format!(
                    "resource #{} is not in the repository",
                    resource.index()
                )));
            }
            if seen.insert(*resource) {
                out.push(*resource);
            }
        }
        Ok(out)
    }
}
