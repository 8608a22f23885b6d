//! The world outside the resolver
//!
//! An [`Environment`] supplies the already-resolved wiring, the capabilities
//! visible to each requirement, and the policy hooks the engine consults
//! while solving. It is a read-only oracle and may be queried any number of
//! times for the same requirement.

pub mod adapter;
pub mod repository;

use std::cmp::Ordering;

use crate::model::namespace::{EFFECTIVE_DIRECTIVE, EFFECTIVE_RESOLVE};
use crate::model::{CapabilityId, Repository, RequirementId, Wiring};

pub use adapter::EnvironmentAdapter;
pub use repository::RepositoryEnvironment;

/// Resolution environment
pub trait Environment {
    /// Wiring that already exists and must not be disturbed
    fn wiring(&self) -> &Wiring;

    /// Superset of the capabilities visible to `requirement`
    ///
    /// The engine still checks each returned capability against the
    /// requirement; returning fewer capabilities narrows the candidates
    /// (this is how global policy such as exclusions is applied).
    fn find_providers(&self, repository: &Repository, requirement: RequirementId) -> Vec<CapabilityId>;

    /// Whether `requirement` takes part in this resolution
    fn is_effective(&self, repository: &Repository, requirement: RequirementId) -> bool {
        repository
            .requirement(requirement)
            .directives()
            .get(EFFECTIVE_DIRECTIVE)
            .map_or(true, |effective| effective == EFFECTIVE_RESOLVE)
    }

    /// Preference between two candidates for the same requirement
    ///
    /// `Ordering::Less` means `a` is preferred.
    fn compare_candidates(&self, repository: &Repository, a: CapabilityId, b: CapabilityId) -> Ordering {
        default_candidate_order(repository, a, b)
    }
}

/// Higher version first, then earlier registration
pub fn default_candidate_order(repository: &Repository, a: CapabilityId, b: CapabilityId) -> Ordering {
    let (cap_a, cap_b) = (repository.capability(a), repository.capability(b));
    cap_b
        .version()
        .cmp(&cap_a.version())
        .then_with(|| cap_a.resource().cmp(&cap_b.resource()))
        .then_with(|| a.cmp(&b))
}
