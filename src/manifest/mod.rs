//! Resource manifests
//!
//! Resources can be declared in TOML instead of through the builder API:
//!
//! ```toml
//! name = "com.example.app"
//! version = "1.2.0"
//! singleton = true
//!
//! [[exports]]
//! package = "com.example.app.api"
//! version = "1.2.0"
//! uses = ["com.example.util"]
//!
//! [[imports]]
//! filter = "(&(osgi.wiring.package=com.example.util)(version>=1.0.0))"
//!
//! [[require_bundles]]
//! filter = "(osgi.wiring.bundle=com.example.base)"
//! reexport = true
//!
//! [[capabilities]]
//! namespace = "osgi.ee"
//! attributes = { "osgi.ee" = "JavaSE", "version:Version" = "1.8" }
//! ```
//!
//! Attribute keys may carry a type suffix: `:Version`, `:Long` or
//! `:List<String>` (comma separated); untyped values are strings.
//! A repository file holds a list of `[[resource]]` tables; a repository
//! directory holds one `resource.toml` per subdirectory (see [`discovery`]).

pub mod discovery;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ResolverError;
use crate::model::namespace::{
    BUNDLE_NAMESPACE, HOST_NAMESPACE, RESOLUTION_DIRECTIVE, RESOLUTION_OPTIONAL, VISIBILITY_DIRECTIVE,
    VISIBILITY_REEXPORT,
};
use crate::model::{
    AttributeValue, Attributes, CapabilityDef, Namespace, Repository, RequirementDef, ResourceDef, ResourceId,
    Version,
};

pub use discovery::ManifestDiscovery;
pub use validator::{ManifestValidator, ValidationResult};

/// File name looked up in each subdirectory of a repository directory
pub const MANIFEST_FILE_NAME: &str = "resource.toml";

/// Exported package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub package: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uses: Vec<String>,
    /// Extra matching attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Imported package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub filter: String,
    #[serde(default)]
    pub optional: bool,
}

/// Required bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequireBundleEntry {
    /// Filter, or a bare bundle name
    pub filter: String,
    #[serde(default)]
    pub optional: bool,
    /// Re-export the required bundle's packages to our own requirers
    #[serde(default)]
    pub reexport: bool,
}

/// Capability or requirement in an arbitrary namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericEntry {
    pub namespace: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub directives: BTreeMap<String, String>,
}

/// Resource manifest (`resource.toml` structure)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceManifest {
    /// Symbolic name
    pub name: String,
    /// Resource version
    pub version: String,
    /// At most one resource with this name may resolve
    #[serde(default)]
    pub singleton: bool,
    /// Host filter, or a bare host name; makes this resource a fragment
    #[serde(default)]
    pub fragment_host: Option<String>,
    #[serde(default)]
    pub exports: Vec<ExportEntry>,
    #[serde(default)]
    pub imports: Vec<ImportEntry>,
    #[serde(default)]
    pub require_bundles: Vec<RequireBundleEntry>,
    #[serde(default)]
    pub capabilities: Vec<GenericEntry>,
    #[serde(default)]
    pub requirements: Vec<GenericEntry>,
}

impl ResourceManifest {
    /// Load manifest from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResolverError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ResolverError::InvalidManifest(format!("Failed to read manifest file: {}", e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse manifest from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ResolverError> {
        let manifest: ResourceManifest = toml::from_str(contents).map_err(|e| {
            ResolverError::InvalidManifest(format!("Failed to parse manifest TOML: {}", e))
        })?;

        if manifest.name.trim().is_empty() {
            return Err(ResolverError::InvalidManifest(
                "Resource name cannot be empty".to_string(),
            ));
        }
        Ok(manifest)
    }

    /// Translate into a resource declaration
    pub fn to_resource_def(&self) -> Result<ResourceDef, ResolverError> {
        let version = Version::parse(&self.version)?;

        let mut def = match &self.fragment_host {
            Some(host) => ResourceDef::fragment(&self.name, version, &host_filter(host)),
            None => ResourceDef::bundle(&self.name, version),
        };
        if self.singleton {
            def = def.singleton();
        }

        for export in &self.exports {
            let version = export
                .version
                .as_deref()
                .map(Version::parse)
                .transpose()?
                .unwrap_or_default();
            let uses: Vec<&str> = export.uses.iter().map(String::as_str).collect();
            def = def.export_package(&export.package, version, &uses);
            if let Some(cap) = def.capabilities.last_mut() {
                cap.attributes.extend(typed_attributes(&export.attributes)?);
            }
        }

        for import in &self.imports {
            def = if import.optional {
                def.import_package_optional(&import.filter)
            } else {
                def.import_package(&import.filter)
            };
        }

        for bundle in &self.require_bundles {
            let mut requirement = RequirementDef::new(Namespace::Bundle).filter(bundle_filter(&bundle.filter));
            if bundle.optional {
                requirement = requirement.directive(RESOLUTION_DIRECTIVE, RESOLUTION_OPTIONAL);
            }
            if bundle.reexport {
                requirement = requirement.directive(VISIBILITY_DIRECTIVE, VISIBILITY_REEXPORT);
            }
            def = def.requirement(requirement);
        }

        for entry in &self.capabilities {
            def = def.capability(CapabilityDef {
                namespace: Some(Namespace::from(entry.namespace.as_str())),
                attributes: typed_attributes(&entry.attributes)?,
                directives: entry.directives.clone().into_iter().collect(),
            });
        }
        for entry in &self.requirements {
            def = def.requirement(RequirementDef {
                namespace: Some(Namespace::from(entry.namespace.as_str())),
                attributes: typed_attributes(&entry.attributes)?,
                directives: entry.directives.clone().into_iter().collect(),
            });
        }

        Ok(def)
    }
}

/// Repository file: a list of `[[resource]]` tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryManifest {
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceManifest>,
}

impl RepositoryManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResolverError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ResolverError::InvalidManifest(format!("Failed to read repository file: {}", e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ResolverError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validate every manifest and build the repository
    pub fn into_repository(self) -> Result<(Repository, Vec<ResourceId>), ResolverError> {
        let validator = ManifestValidator::new();
        let mut repository = Repository::new();
        let mut ids = Vec::with_capacity(self.resources.len());

        for manifest in &self.resources {
            if let ValidationResult::Invalid(errors) = validator.validate(manifest) {
                return Err(ResolverError::InvalidManifest(format!(
                    "{}: {}",
                    manifest.name,
                    errors.join("; ")
                )));
            }
            let version = Version::parse(&manifest.version)?;
            if repository.find(&manifest.name, Some(&version)).is_some() {
                return Err(ResolverError::InvalidManifest(format!(
                    "duplicate resource {} {}",
                    manifest.name, version
                )));
            }
            let id = repository.add(manifest.to_resource_def()?)?;
            debug!("Loaded resource {}", repository.identity(id));
            ids.push(id);
        }
        Ok((repository, ids))
    }
}

/// Load a repository from a `[[resource]]` file or a manifest directory
pub fn load_repository<P: AsRef<Path>>(path: P) -> Result<(Repository, Vec<ResourceId>), ResolverError> {
    let path = path.as_ref();
    let manifest = if path.is_dir() {
        let resources = ManifestDiscovery::new(path)
            .discover()?
            .into_iter()
            .map(|d| d.manifest)
            .collect();
        RepositoryManifest { resources }
    } else {
        RepositoryManifest::from_file(path)?
    };

    let loaded = manifest.into_repository()?;
    info!("Loaded {} resource(s) from {:?}", loaded.1.len(), path);
    Ok(loaded)
}

/// Attribute type suffixes accepted in manifest keys
pub const ATTRIBUTE_TYPES: &[&str] = &["String", "Version", "Long", "List<String>"];

/// Parse one `key[:Type] = value` manifest attribute
pub fn typed_attribute(key: &str, value: &str) -> Result<(String, AttributeValue), ResolverError> {
    let (name, kind) = match key.split_once(':') {
        Some((name, kind)) => (name.trim(), kind.trim()),
        None => (key.trim(), "String"),
    };
    let value = match kind {
        "String" => AttributeValue::String(value.to_string()),
        "Version" => AttributeValue::Version(Version::parse(value)?),
        "Long" => AttributeValue::Long(value.trim().parse().map_err(|_| {
            ResolverError::InvalidAttribute(format!("{}: \"{}\" is not a Long", name, value))
        })?),
        "List<String>" => AttributeValue::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        other => {
            return Err(ResolverError::InvalidAttribute(format!(
                "{}: unknown attribute type {}",
                name, other
            )))
        }
    };
    Ok((name.to_string(), value))
}

fn typed_attributes(raw: &BTreeMap<String, String>) -> Result<Attributes, ResolverError> {
    raw.iter().map(|(k, v)| typed_attribute(k, v)).collect()
}

/// Wrap a bare name as `(attribute=name)`; filters pass through
fn name_or_filter(attribute: &str, value: &str) -> String {
    let value = value.trim();
    if value.starts_with('(') {
        value.to_string()
    } else {
        format!("({}={})", attribute, value)
    }
}

/// `fragment_host` accepts a filter or a bare host name
fn host_filter(host: &str) -> String {
    name_or_filter(HOST_NAMESPACE, host)
}

/// `require_bundles` entries accept a filter or a bare bundle name
pub fn bundle_filter(bundle: &str) -> String {
    name_or_filter(BUNDLE_NAMESPACE, bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::namespace::CARDINALITY_UNBOUNDED;

    const APP: &str = r#"
name = "app"
version = "1.2.0"
singleton = true

[[exports]]
package = "app.api"
version = "1.2.0"
uses = ["util"]

[[imports]]
filter = "(&(osgi.wiring.package=util)(version>=1.0.0))"

[[imports]]
filter = "(osgi.wiring.package=extras)"
optional = true

[[require_bundles]]
filter = "(osgi.wiring.bundle=base)"
reexport = true

[[capabilities]]
namespace = "osgi.ee"
attributes = { "osgi.ee" = "JavaSE", "version:Version" = "1.8", "slots:Long" = "4", "tags:List<String>" = "a, b" }

[[requirements]]
namespace = "osgi.service"
directives = { filter = "(objectClass=log)", cardinality = "multiple" }
"#;

    #[test]
    fn test_manifest_to_resource() {
        let manifest = ResourceManifest::from_toml(APP).unwrap();
        let mut repo = Repository::new();
        let id = repo.add(manifest.to_resource_def().unwrap()).unwrap();

        let identity = repo.identity(id);
        assert_eq!(identity.name, "app");
        assert!(identity.singleton);
        assert_eq!(repo.requirements(id, Some(&Namespace::Package)).count(), 2);

        let bundle_req = repo.requirements(id, Some(&Namespace::Bundle)).next().unwrap();
        assert!(repo.requirement(bundle_req).is_reexport());

        let ee = Namespace::from("osgi.ee");
        let cap = repo.capability(repo.capabilities(id, Some(&ee)).next().unwrap());
        assert_eq!(cap.attributes().get("version"), Some(&AttributeValue::Version(Version::new(1, 8, 0))));
        assert_eq!(cap.attributes().get("slots"), Some(&AttributeValue::Long(4)));
        assert_eq!(
            cap.attributes().get("tags"),
            Some(&AttributeValue::List(vec!["a".to_string(), "b".to_string()]))
        );

        let service = Namespace::from("osgi.service");
        let req = repo.requirement(repo.requirements(id, Some(&service)).next().unwrap());
        assert_eq!(req.cardinality(), CARDINALITY_UNBOUNDED);
    }

    #[test]
    fn test_fragment_host_shorthand() {
        let manifest = ResourceManifest::from_toml("name = \"frag\"\nversion = \"1.0\"\nfragment_host = \"app\"\n").unwrap();
        let mut repo = Repository::new();
        let id = repo.add(manifest.to_resource_def().unwrap()).unwrap();
        assert!(repo.resource(id).is_fragment());
        let req = repo.requirement(repo.requirements(id, None).next().unwrap());
        assert_eq!(req.filter(), Some("(osgi.wiring.host=app)"));
    }

    #[test]
    fn test_unknown_attribute_type() {
        let err = typed_attribute("x:Double", "1.5").unwrap_err();
        assert!(matches!(err, ResolverError::InvalidAttribute(_)));
        assert!(typed_attribute("x:Long", "many").is_err());
    }

    #[test]
    fn test_repository_rejects_duplicates() {
        let text = "[[resource]]\nname = \"a\"\nversion = \"1.0\"\n\n[[resource]]\nname = \"a\"\nversion = \"1.0.0\"\n";
        let err = RepositoryManifest::from_toml(text).unwrap().into_repository().unwrap_err();
        assert!(matches!(err, ResolverError::InvalidManifest(_)));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(ResourceManifest::from_toml("name = \"\"\nversion = \"1.0\"\n").is_err());
    }
}
