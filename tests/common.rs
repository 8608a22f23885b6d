//! Shared helpers for integration tests
#![allow(dead_code)]

use bllvm_resolver::model::{Namespace, Repository, ResourceDef, ResourceId, Version, Wire, Wiring};
use bllvm_resolver::{Environment, RepositoryEnvironment, Resolver, ResolverError};

/// Parse a version literal
pub fn v(version: &str) -> Version {
    Version::parse(version).unwrap()
}

/// Add a declaration to the repository
pub fn add(repo: &mut Repository, def: ResourceDef) -> ResourceId {
    repo.add(def).unwrap()
}

/// `(osgi.wiring.package=name)`
pub fn pkg(name: &str) -> String {
    format!("(osgi.wiring.package={})", name)
}

/// `(osgi.wiring.bundle=name)`
pub fn bundle_req(name: &str) -> String {
    format!("(osgi.wiring.bundle={})", name)
}

/// Resolve with the default configuration
pub fn resolve(
    repo: &Repository,
    mandatory: &[ResourceId],
    optional: &[ResourceId],
    env: &dyn Environment,
) -> Result<Wiring, ResolverError> {
    Resolver::default().resolve(repo, mandatory, optional, env)
}

/// Resolve against an empty environment
pub fn resolve_simple(repo: &Repository, mandatory: &[ResourceId]) -> Wiring {
    resolve(repo, mandatory, &[], &RepositoryEnvironment::new()).unwrap()
}

/// Providers `requirer` is wired to in `namespace`, in wire order
pub fn providers(repo: &Repository, wiring: &Wiring, requirer: ResourceId, namespace: &Namespace) -> Vec<ResourceId> {
    wiring
        .wires_in(repo, requirer, namespace)
        .map(|w| w.provider)
        .collect()
}

/// Wires of `resource`, empty when absent
pub fn wires(wiring: &Wiring, resource: ResourceId) -> Vec<Wire> {
    wiring.get(resource).map(<[Wire]>::to_vec).unwrap_or_default()
}

/// Checks the structural wire invariants over a whole wiring
pub fn assert_wire_invariants(repo: &Repository, wiring: &Wiring) {
    for (resource, wires) in wiring.iter() {
        for wire in wires {
            let requirement = repo.requirement(wire.requirement);
            let capability = repo.capability(wire.capability);
            assert_eq!(wire.requirer, resource);
            assert_eq!(requirement.resource(), wire.requirer);
            assert_eq!(capability.resource(), wire.provider);
            assert_eq!(requirement.namespace(), capability.namespace());
        }
    }
}
