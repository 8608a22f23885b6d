//! Package uses constraints
//!
//! Every resource sees a package space: the packages it imports, the packages
//! it exports and does not import, and the packages of the bundles it
//! requires (following reexports). A package that `uses` other packages pins
//! the consumer's view of those packages to the provider's view, transitively.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::candidates::Candidates;
use crate::environment::EnvironmentAdapter;
use crate::model::{CapabilityId, Namespace, Repository, RequirementId, ResourceId};

/// Where a resource gets a package from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageSource {
    pub capability: CapabilityId,
    /// Requirement that brought the package in; `None` for own exports
    pub requirement: Option<RequirementId>,
}

pub type PackageSpace = BTreeMap<String, Vec<PackageSource>>;

/// A violated uses constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Resource whose class space is inconsistent
    pub resource: ResourceId,
    /// Package seen through two incompatible sources
    pub package: String,
    /// Requirements whose selection may be revisited to remove the conflict
    pub blame: Vec<RequirementId>,
}

impl Conflict {
    /// Permutations of `candidates` that each drop one blamed selection
    pub fn permutations(&self, repository: &Repository, candidates: &Candidates) -> Vec<Candidates> {
        self.blame
            .iter()
            .filter_map(|req| candidates.without_selected(repository, *req))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct UsedPackage {
    source: PackageSource,
    holder: ResourceId,
}

/// Uses-constraint checker over one candidate permutation
pub struct UsesChecker<'a> {
    repository: &'a Repository,
    pinned: &'a BTreeSet<ResourceId>,
    spaces: BTreeMap<ResourceId, PackageSpace>,
}

impl<'a> UsesChecker<'a> {
    pub fn new(
        adapter: &EnvironmentAdapter<'a>,
        candidates: &Candidates,
        viable: &BTreeSet<ResourceId>,
        pinned: &'a BTreeSet<ResourceId>,
    ) -> Self {
        let repository = adapter.repository();
        let spaces = viable
            .iter()
            .map(|r| (*r, package_space(adapter, candidates, *r)))
            .collect();
        Self {
            repository,
            pinned,
            spaces,
        }
    }

    pub fn space(&self, resource: ResourceId) -> Option<&PackageSpace> {
        self.spaces.get(&resource)
    }

    /// First conflict among the unpinned viable resources, in id order
    pub fn check(&self) -> Option<Conflict> {
        self.spaces
            .keys()
            .filter(|r| !self.pinned.contains(r))
            .find_map(|r| self.check_resource(*r))
    }

    fn check_resource(&self, resource: ResourceId) -> Option<Conflict> {
        let space = self.spaces.get(&resource)?;
        let mut implied: BTreeMap<String, (UsedPackage, Option<RequirementId>)> = BTreeMap::new();

        for sources in space.values() {
            for root in sources {
                for used in self.used_packages(root.capability) {
                    let capability = self.repository.capability(used.source.capability);
                    let Some(package) = capability.name() else {
                        continue;
                    };

                    if let Some(mine) = space.get(package) {
                        if mine.iter().any(|m| m.capability == used.source.capability) {
                            continue;
                        }
                        let mut blame = vec![root.requirement];
                        blame.extend(mine.iter().map(|m| m.requirement));
                        blame.push(self.via(&used));
                        return Some(self.conflict(resource, package, blame));
                    }

                    match implied.get(package) {
                        None => {
                            implied.insert(package.to_string(), (used, root.requirement));
                        }
                        Some((other, other_root)) if other.source.capability != used.source.capability => {
                            let blame = vec![root.requirement, self.via(&used), *other_root, self.via(other)];
                            return Some(self.conflict(resource, package, blame));
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        None
    }

    fn via(&self, used: &UsedPackage) -> Option<RequirementId> {
        if self.pinned.contains(&used.holder) {
            None
        } else {
            used.source.requirement
        }
    }

    fn conflict(&self, resource: ResourceId, package: &str, blame: Vec<Option<RequirementId>>) -> Conflict {
        let mut seen = BTreeSet::new();
        let blame = blame
            .into_iter()
            .flatten()
            .filter(|req| seen.insert(*req))
            .collect();
        debug!(
            "Uses conflict in {} on package {}",
            self.repository.identity(resource),
            package
        );
        Conflict {
            resource,
            package: package.to_string(),
            blame,
        }
    }

    /// Packages transitively used by `capability`, as seen by their holders
    fn used_packages(&self, capability: CapabilityId) -> Vec<UsedPackage> {
        let mut out = Vec::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![capability];
        visited.insert(capability);

        while let Some(current) = stack.pop() {
            let cap = self.repository.capability(current);
            let holder = cap.resource();
            let Some(space) = self.spaces.get(&holder) else {
                continue;
            };
            for package in cap.uses() {
                for source in space.get(&package).into_iter().flatten() {
                    out.push(UsedPackage {
                        source: *source,
                        holder,
                    });
                    if visited.insert(source.capability) {
                        stack.push(source.capability);
                    }
                }
            }
        }
        out
    }
}

/// Package space of `resource` under `candidates`
pub fn package_space(adapter: &EnvironmentAdapter<'_>, candidates: &Candidates, resource: ResourceId) -> PackageSpace {
    let repository = adapter.repository();
    let mut space = PackageSpace::new();
    let Some(description) = adapter.description(resource) else {
        return space;
    };

    for requirement in description.requirements.iter().filter(|r| r.namespace == Namespace::Package) {
        for cap in candidates.selected(repository, requirement.id) {
            if let Some(name) = repository.capability(*cap).name() {
                push_source(&mut space, name, *cap, Some(requirement.id));
            }
        }
    }
    let imported: BTreeSet<String> = space.keys().cloned().collect();

    for (name, cap) in &description.exports {
        if !imported.contains(name) {
            push_source(&mut space, name, *cap, None);
        }
    }

    for requirement in description.requirements.iter().filter(|r| r.namespace == Namespace::Bundle) {
        let mut visited = BTreeSet::new();
        for cap in candidates.selected(repository, requirement.id) {
            let provider = repository.capability(*cap).resource();
            for (name, export) in bundle_exports(adapter, candidates, provider, &mut visited) {
                if !imported.contains(&name) {
                    push_source(&mut space, &name, export, Some(requirement.id));
                }
            }
        }
    }
    space
}

/// Packages a required bundle makes visible: its exports plus those of the
/// bundles it reexports
fn bundle_exports(
    adapter: &EnvironmentAdapter<'_>,
    candidates: &Candidates,
    bundle: ResourceId,
    visited: &mut BTreeSet<ResourceId>,
) -> Vec<(String, CapabilityId)> {
    if !visited.insert(bundle) {
        return Vec::new();
    }
    let Some(description) = adapter.description(bundle) else {
        return Vec::new();
    };
    let repository = adapter.repository();

    let mut exports: Vec<(String, CapabilityId)> =
        description.exports.iter().map(|(n, c)| (n.clone(), *c)).collect();
    for requirement in &description.requirements {
        if requirement.namespace != Namespace::Bundle || !requirement.reexport {
            continue;
        }
        for cap in candidates.selected(repository, requirement.id) {
            let provider = repository.capability(*cap).resource();
            exports.extend(bundle_exports(adapter, candidates, provider, visited));
        }
    }
    exports
}

fn push_source(space: &mut PackageSpace, name: &str, capability: CapabilityId, requirement: Option<RequirementId>) {
    let sources = space.entry(name.to_string()).or_default();
    if !sources.iter().any(|s| s.capability == capability) {
        sources.push(PackageSource {
            capability,
            requirement,
        });
    }
}
