//! Manifest discovery
//!
//! Scans a repository directory for `resource.toml` manifests, one per
//! subdirectory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{ManifestValidator, ResourceManifest, ValidationResult, MANIFEST_FILE_NAME};
use crate::error::ResolverError;

/// Discovered manifest
#[derive(Debug, Clone)]
pub struct DiscoveredManifest {
    /// Resource directory path
    pub directory: PathBuf,
    /// Parsed manifest
    pub manifest: ResourceManifest,
}

/// Manifest discovery scanner
pub struct ManifestDiscovery {
    /// Base directory to scan
    root: PathBuf,
}

impl ManifestDiscovery {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Discover every valid manifest below the root, in directory-name order
    ///
    /// Unparseable or invalid manifests are skipped with a warning.
    pub fn discover(&self) -> Result<Vec<DiscoveredManifest>, ResolverError> {
        info!("Discovering resource manifests in {:?}", self.root);

        let entries = fs::read_dir(&self.root).map_err(|e| {
            ResolverError::InvalidManifest(format!("Failed to read repository directory: {}", e))
        })?;

        let mut directories = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ResolverError::InvalidManifest(format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.is_dir() {
                directories.push(path);
            }
        }
        directories.sort();

        let validator = ManifestValidator::new();
        let mut manifests = Vec::new();
        for directory in directories {
            let manifest_path = directory.join(MANIFEST_FILE_NAME);
            if !manifest_path.exists() {
                debug!("No {} found in {:?}, skipping", MANIFEST_FILE_NAME, directory);
                continue;
            }

            match ResourceManifest::from_file(&manifest_path) {
                Ok(manifest) => match validator.validate(&manifest) {
                    ValidationResult::Valid => manifests.push(DiscoveredManifest { directory, manifest }),
                    ValidationResult::Invalid(errors) => {
                        warn!("Skipping invalid manifest in {:?}: {:?}", directory, errors);
                    }
                },
                Err(e) => {
                    warn!("Failed to parse manifest in {:?}: {}", directory, e);
                }
            }
        }

        info!("Discovered {} resource manifest(s)", manifests.len());
        Ok(manifests)
    }
}
