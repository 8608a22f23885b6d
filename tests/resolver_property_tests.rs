//! Property-based tests for resolution
//!
//! Generates layered repositories where every import has at least one
//! exporter and checks the wiring invariants of the result.

use bllvm_resolver::model::{Namespace, Repository, ResourceDef, ResourceId, Version};
use bllvm_resolver::{RepositoryEnvironment, Resolver};
use proptest::prelude::*;
mod common;
use common::*;

/// `(exported version, imported package indices)` per resource
type Layout = Vec<(u64, Vec<usize>)>;

fn layout() -> impl Strategy<Value = Layout> {
    prop::collection::vec((1u64..4, prop::collection::vec(any::<prop::sample::Index>(), 0..3)), 1..12).prop_map(
        |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (version, picks))| {
                    let imports = if i == 0 {
                        Vec::new()
                    } else {
                        let mut imports: Vec<usize> = picks.iter().map(|p| p.index(i)).collect();
                        imports.sort_unstable();
                        imports.dedup();
                        imports
                    };
                    (version, imports)
                })
                .collect()
        },
    )
}

/// Resource `i` exports `p{i}` and imports `p{j}` for `j < i`
fn build(layout: &Layout) -> (Repository, Vec<ResourceId>) {
    let mut repo = Repository::new();
    let ids = layout
        .iter()
        .enumerate()
        .map(|(i, (version, imports))| {
            let mut def = ResourceDef::bundle(format!("r{}", i), Version::new(*version, 0, 0)).export_package(
                &format!("p{}", i),
                Version::new(*version, 0, 0),
                &[],
            );
            for j in imports {
                def = def.import_package(&pkg(&format!("p{}", j)));
            }
            add(&mut repo, def)
        })
        .collect();
    (repo, ids)
}

proptest! {
    /// Property: every import of every resolved resource is wired exactly once
    #[test]
    fn prop_layered_repositories_resolve(layout in layout()) {
        let (repo, ids) = build(&layout);
        let root = *ids.last().unwrap();

        let wiring = resolve_simple(&repo, &[root]);
        assert_wire_invariants(&repo, &wiring);
        prop_assert!(wiring.contains(root));

        for (resource, wires) in wiring.iter() {
            let imports = repo.requirements(resource, Some(&Namespace::Package)).count();
            prop_assert_eq!(wires.len(), imports);
            for wire in wires {
                prop_assert!(wiring.contains(wire.provider));
            }
        }
    }

    /// Property: resolving twice gives the same wiring
    #[test]
    fn prop_resolution_is_deterministic(layout in layout()) {
        let (repo, ids) = build(&layout);
        let resolver = Resolver::default();
        let env = RepositoryEnvironment::new();

        let first = resolver.resolve(&repo, &ids, &[], &env).unwrap();
        let second = resolver.resolve(&repo, &ids, &[], &env).unwrap();
        prop_assert_eq!(first.len(), ids.len());
        prop_assert_eq!(first, second);
    }
}
