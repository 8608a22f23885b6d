#![no_main]
use bllvm_resolver::manifest::{ManifestValidator, RepositoryManifest};
use bllvm_resolver::{RepositoryEnvironment, Resolver};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(manifest) = RepositoryManifest::from_toml(text) else {
        return;
    };

    let validator = ManifestValidator::new();
    for resource in &manifest.resources {
        let _ = validator.validate(resource);
    }

    // Loading either fails cleanly or yields a resolvable repository
    if let Ok((repository, ids)) = manifest.into_repository() {
        let _ = Resolver::default().resolve(&repository, &[], &ids, &RepositoryEnvironment::new());
    }
});
