//! Turning a solution into a wiring

use std::collections::VecDeque;
use tracing::debug;

use super::solver::Solution;
use crate::environment::EnvironmentAdapter;
use crate::error::ResolverError;
use crate::model::{ResourceId, Wire, Wiring};

/// Wires of one resolved resource, in requirement declaration order
pub fn wires_for(
    adapter: &EnvironmentAdapter<'_>,
    solution: &Solution,
    resource: ResourceId,
) -> Result<Vec<Wire>, ResolverError> {
    let repository = adapter.repository();
    let mut wires = Vec::new();
    let Some(description) = adapter.description(resource) else {
        return Ok(wires);
    };
    for requirement in &description.requirements {
        for cap in solution.candidates.selected(repository, requirement.id) {
            wires.push(Wire::new(repository, requirement.id, *cap)?);
        }
    }
    Ok(wires)
}

/// Add `root` and every unpinned resource it transitively wires to
///
/// Pinned resources keep the wires recorded in the snapshot.
pub fn harvest(
    adapter: &EnvironmentAdapter<'_>,
    solution: &Solution,
    root: ResourceId,
    result: &mut Wiring,
) -> Result<(), ResolverError> {
    if result.contains(root) {
        return Ok(());
    }
    if adapter.is_pinned(root) {
        let wires = adapter.snapshot().get(root).map(<[Wire]>::to_vec).unwrap_or_default();
        result.insert(root, wires);
        return Ok(());
    }

    let repository = adapter.repository();
    let mut queue = VecDeque::from([root]);
    while let Some(resource) = queue.pop_front() {
        if result.contains(resource) {
            continue;
        }
        let wires = wires_for(adapter, solution, resource)?;
        for wire in &wires {
            if !adapter.is_pinned(wire.provider) && !result.contains(wire.provider) {
                queue.push_back(wire.provider);
            }
        }
        debug!("Harvested {} wire(s) for {}", wires.len(), repository.identity(resource));
        result.insert(resource, wires);
    }
    Ok(())
}
