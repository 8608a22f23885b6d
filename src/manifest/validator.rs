//! Manifest validation
//!
//! Checks manifests for structure before they are turned into resources, so
//! that every problem in a manifest is reported at once.

use tracing::{debug, warn};

use super::{bundle_filter, host_filter, typed_attribute, ResourceManifest};
use crate::filter::FilterComponent;
use crate::model::{Namespace, Version};
use crate::resolver::description::NamedSpec;
use crate::utils::{ensure_fmt, ensure_not_blank};

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Manifest is valid
    Valid,
    /// Manifest is invalid with specific errors
    Invalid(Vec<String>),
}

/// Manifest validator
pub struct ManifestValidator {
    /// Maximum symbolic name length
    max_name_length: usize,
}

impl ManifestValidator {
    /// Create a new manifest validator
    pub fn new() -> Self {
        Self { max_name_length: 255 }
    }

    /// Validate a resource manifest
    pub fn validate(&self, manifest: &ResourceManifest) -> ValidationResult {
        let mut errors = Vec::new();

        if let Err(e) = ensure_fmt(self.is_valid_name(&manifest.name), || {
            format!(
                "Invalid resource name: {} (must be dot-separated alphanumerics, dashes or underscores)",
                manifest.name
            )
        }) {
            errors.push(e);
        }

        if let Err(e) = Version::parse(&manifest.version) {
            errors.push(format!("Invalid version {}: {}", manifest.version, e));
        }

        if let Some(host) = &manifest.fragment_host {
            self.check_name_or_filter(host, &host_filter(host), Namespace::Host, "fragment host", &mut errors);
        }

        for export in &manifest.exports {
            if !self.is_valid_name(&export.package) {
                errors.push(format!("Invalid exported package name: {}", export.package));
            }
            if let Some(version) = &export.version {
                if let Err(e) = Version::parse(version) {
                    errors.push(format!("Invalid version {} for package {}: {}", version, export.package, e));
                }
            }
            for used in &export.uses {
                if !self.is_valid_name(used) {
                    errors.push(format!("Invalid uses entry {} on package {}", used, export.package));
                }
            }
            self.check_attributes(export.attributes.iter(), &mut errors);
        }

        for import in &manifest.imports {
            self.check_named_filter(&Namespace::Package, Some(&import.filter), "import", &mut errors);
        }
        for bundle in &manifest.require_bundles {
            self.check_name_or_filter(
                &bundle.filter,
                &bundle_filter(&bundle.filter),
                Namespace::Bundle,
                "required bundle",
                &mut errors,
            );
        }

        for entry in manifest.capabilities.iter().chain(&manifest.requirements) {
            if let Err(e) = ensure_not_blank(&entry.namespace, "namespace") {
                errors.push(e);
            }
            self.check_attributes(entry.attributes.iter(), &mut errors);
        }
        for entry in &manifest.requirements {
            let filter = entry.directives.get("filter").map(String::as_str);
            match Namespace::from(entry.namespace.as_str()) {
                namespace @ (Namespace::Bundle | Namespace::Host | Namespace::Package) => {
                    self.check_named_filter(&namespace, filter, &entry.namespace, &mut errors)
                }
                _ => {
                    if let Some(filter) = filter {
                        self.check_filter(filter, &entry.namespace, &mut errors);
                    }
                }
            }
        }

        if errors.is_empty() {
            debug!("Manifest validation passed for resource: {}", manifest.name);
            ValidationResult::Valid
        } else {
            warn!(
                "Manifest validation failed for resource {}: {:?}",
                manifest.name, errors
            );
            ValidationResult::Invalid(errors)
        }
    }

    /// Symbolic or package name: dot-separated segments of alphanumerics,
    /// dashes and underscores
    fn is_valid_name(&self, name: &str) -> bool {
        if name.is_empty() || name.len() > self.max_name_length {
            return false;
        }
        name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        })
    }

    fn check_filter(&self, filter: &str, context: &str, errors: &mut Vec<String>) {
        if let Err(e) = FilterComponent::parse(filter) {
            errors.push(format!("Invalid {} filter: {}", context, e));
        }
    }

    /// Bundle, host and package filters must also reduce to a name and
    /// version range, as the resolver requires
    fn check_named_filter(
        &self,
        namespace: &Namespace,
        filter: Option<&str>,
        context: &str,
        errors: &mut Vec<String>,
    ) {
        if let Err(e) = NamedSpec::from_filter(namespace, filter) {
            errors.push(format!("Invalid {} filter: {}", context, e));
        }
    }

    fn check_name_or_filter(
        &self,
        value: &str,
        filter: &str,
        namespace: Namespace,
        context: &str,
        errors: &mut Vec<String>,
    ) {
        if value.trim_start().starts_with('(') || self.is_valid_name(value.trim()) {
            self.check_named_filter(&namespace, Some(filter), context, errors);
        } else {
            errors.push(format!("Invalid {}: {}", context, value));
        }
    }

    fn check_attributes<'m>(
        &self,
        attributes: impl Iterator<Item = (&'m String, &'m String)>,
        errors: &mut Vec<String>,
    ) {
        for (key, value) in attributes {
            if let Err(e) = typed_attribute(key, value) {
                errors.push(e.to_string());
            }
        }
    }
}

impl Default for ManifestValidator {
    fn default() -> Self {
        Self::new()
    }
}
