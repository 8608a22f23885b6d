//! Manifest loading and resolution from TOML repositories

mod common;

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use bllvm_resolver::manifest::{load_repository, ManifestDiscovery, RepositoryManifest, MANIFEST_FILE_NAME};
use bllvm_resolver::model::Namespace;
use bllvm_resolver::{RepositoryEnvironment, Resolver, ResolverError};
use common::{assert_wire_invariants, providers, v};

const REPOSITORY: &str = r#"
[[resource]]
name = "app"
version = "1.0.0"

[[resource.imports]]
filter = "(&(osgi.wiring.package=log.api)(version>=1.0.0)(!(version>=2.0.0)))"

[[resource.require_bundles]]
filter = "base"

[[resource]]
name = "log"
version = "1.4.0"

[[resource.exports]]
package = "log.api"
version = "1.4.0"

[[resource]]
name = "log"
version = "2.0.0"

[[resource.exports]]
package = "log.api"
version = "2.0.0"

[[resource]]
name = "base"
version = "3.1.0"
singleton = true

[[resource]]
name = "base.nls"
version = "3.1.0"
fragment_host = "base"

[[resource.capabilities]]
namespace = "example.locale"
attributes = { "example.locale" = "de", "priority:Long" = "5" }
"#;

fn write_manifest(root: &Path, directory: &str, contents: &str) {
    let dir = root.join(directory);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(MANIFEST_FILE_NAME), contents).unwrap();
}

#[test]
fn test_resolve_repository_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("repository.toml");
    fs::write(&path, REPOSITORY).unwrap();

    let (repo, ids) = load_repository(&path).unwrap();
    assert_eq!(ids.len(), 5);

    let app = repo.find("app", None).unwrap();
    let log14 = repo.find("log", Some(&v("1.4.0"))).unwrap();
    let base = repo.find("base", None).unwrap();
    let nls = repo.find("base.nls", None).unwrap();

    let wiring = Resolver::default()
        .resolve(&repo, &[app], &[nls], &RepositoryEnvironment::new())
        .unwrap();
    assert_eq!(providers(&repo, &wiring, app, &Namespace::Package), vec![log14]);
    assert_eq!(providers(&repo, &wiring, app, &Namespace::Bundle), vec![base]);
    assert_eq!(providers(&repo, &wiring, nls, &Namespace::Host), vec![base]);
    assert_wire_invariants(&repo, &wiring);
}

#[test]
fn test_duplicate_resources_rejected() {
    let text = "[[resource]]\nname = \"a\"\nversion = \"1.0\"\n[[resource]]\nname = \"a\"\nversion = \"1.0.0\"\n";
    let err = RepositoryManifest::from_toml(text)
        .unwrap()
        .into_repository()
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidManifest(msg) if msg.contains("duplicate resource")));
}

#[test]
fn test_invalid_manifest_in_file_rejected() {
    let text = "[[resource]]\nname = \"a\"\nversion = \"1.0\"\n[[resource.imports]]\nfilter = \"(x=\"\n";
    let err = RepositoryManifest::from_toml(text)
        .unwrap()
        .into_repository()
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidManifest(msg) if msg.starts_with("a: ")));
}

#[test]
fn test_untranslatable_import_rejected_at_load() {
    let text = r#"
[[resource]]
name = "app"
version = "1.0"
[[resource.imports]]
filter = "(osgi.wiring.package=p)"

[[resource]]
name = "good"
version = "1.0"
[[resource.exports]]
package = "p"

[[resource]]
name = "odd"
version = "1.0"
[[resource.exports]]
package = "p"
[[resource.imports]]
filter = "(|(osgi.wiring.package=x)(osgi.wiring.package=y))"
"#;
    let err = RepositoryManifest::from_toml(text)
        .unwrap()
        .into_repository()
        .unwrap_err();
    assert!(matches!(err, ResolverError::InvalidManifest(msg) if msg.starts_with("odd: ")));
}

#[test]
fn test_directory_discovery_skips_broken_manifests() {
    let temp = TempDir::new().unwrap();
    write_manifest(
        temp.path(),
        "b-consumer",
        "name = \"consumer\"\nversion = \"1.0\"\n[[imports]]\nfilter = \"(osgi.wiring.package=api)\"\n",
    );
    write_manifest(
        temp.path(),
        "a-provider",
        "name = \"provider\"\nversion = \"1.0\"\n[[exports]]\npackage = \"api\"\nversion = \"1.0\"\n",
    );
    write_manifest(temp.path(), "c-broken", "name = ");
    write_manifest(temp.path(), "d-invalid", "name = \"bad name\"\nversion = \"1.0\"\n");
    fs::create_dir_all(temp.path().join("e-empty")).unwrap();
    fs::write(temp.path().join("stray.toml"), "not a resource").unwrap();

    let discovered = ManifestDiscovery::new(temp.path()).discover().unwrap();
    let names: Vec<_> = discovered.iter().map(|d| d.manifest.name.as_str()).collect();
    assert_eq!(names, vec!["provider", "consumer"]);

    let (repo, ids) = load_repository(temp.path()).unwrap();
    assert_eq!(ids.len(), 2);
    let consumer = repo.find("consumer", None).unwrap();
    let provider = repo.find("provider", None).unwrap();

    let wiring = Resolver::default()
        .resolve(&repo, &[consumer], &[], &RepositoryEnvironment::new())
        .unwrap();
    assert_eq!(providers(&repo, &wiring, consumer, &Namespace::Package), vec![provider]);
}

#[test]
fn test_missing_directory_is_an_error() {
    let temp = TempDir::new().unwrap();
    assert!(ManifestDiscovery::new(temp.path().join("nowhere")).discover().is_err());
}
