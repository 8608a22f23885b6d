//! Standard attribute extraction
//!
//! Folds a conjunctive filter back into the plain attribute map it encodes:
//! equality items become entries, and comparisons on version attributes
//! become a single range string per attribute.

use std::collections::BTreeMap;

use super::FilterComponent;
use crate::error::ResolverError;

#[derive(Default)]
struct RangeBounds {
    start: Option<String>,
    end: Option<String>,
}

impl RangeBounds {
    fn set_start(&mut self, attr: &str, start: String) -> Result<(), ResolverError> {
        if self.start.is_some() {
            return Err(ResolverError::InvalidAttribute(format!(
                "range start already defined for attribute {}",
                attr
            )));
        }
        self.start = Some(start);
        Ok(())
    }

    fn set_end(&mut self, attr: &str, end: String) -> Result<(), ResolverError> {
        if self.end.is_some() {
            return Err(ResolverError::InvalidAttribute(format!(
                "range end already processed for attribute {}",
                attr
            )));
        }
        self.end = Some(end);
        Ok(())
    }

    fn into_range(self) -> Option<String> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(format!("{},{}", start, end)),
            (Some(start), None) => Some(start),
            (None, Some(end)) => Some(format!("[0.0.0,{}", end)),
            (None, None) => None,
        }
    }
}

struct Extractor<'a> {
    version_attributes: &'a [&'a str],
    attributes: BTreeMap<String, String>,
    ranges: BTreeMap<String, RangeBounds>,
}

impl<'a> Extractor<'a> {
    fn is_version_attribute(&self, attr: &str) -> bool {
        self.version_attributes.contains(&attr)
    }

    fn range(&mut self, attr: &str) -> &mut RangeBounds {
        self.ranges.entry(attr.to_string()).or_default()
    }

    fn process(&mut self, component: &FilterComponent, negated: bool) -> Result<(), ResolverError> {
        match component {
            FilterComponent::And(children) if !negated => {
                for child in children {
                    self.process(child, false)?;
                }
                Ok(())
            }
            FilterComponent::Not(child) if !negated => self.process(child, true),
            FilterComponent::Equal { attr, value } if !negated => {
                if self.is_version_attribute(attr) {
                    let value = value.trim();
                    self.range(attr).set_start(attr, format!("[{}", value))?;
                    self.range(attr).set_end(attr, format!("{}]", value))?;
                } else if let Some(existing) = self.attributes.get(attr) {
                    if existing != value {
                        return Err(ResolverError::InvalidAttribute(format!(
                            "conflicting values for attribute {}: {} and {}",
                            attr, existing, value
                        )));
                    }
                } else {
                    self.attributes.insert(attr.clone(), value.clone());
                }
                Ok(())
            }
            FilterComponent::Greater { attr, value } => {
                self.require_version_attribute(attr, ">=")?;
                let value = value.trim();
                if negated {
                    self.range(attr).set_end(attr, format!("{})", value))
                } else {
                    self.range(attr).set_start(attr, format!("[{}", value))
                }
            }
            FilterComponent::Less { attr, value } => {
                self.require_version_attribute(attr, "<=")?;
                let value = value.trim();
                if negated {
                    self.range(attr).set_start(attr, format!("({}", value))
                } else {
                    self.range(attr).set_end(attr, format!("{}]", value))
                }
            }
            other => Err(ResolverError::InvalidAttribute(format!(
                "unsupported {}component in standard attribute filter: {}",
                if negated { "negated " } else { "" },
                other
            ))),
        }
    }

    fn require_version_attribute(&self, attr: &str, op: &str) -> Result<(), ResolverError> {
        if self.is_version_attribute(attr) {
            Ok(())
        } else {
            Err(ResolverError::InvalidAttribute(format!(
                "operator {} is only supported on version attributes, not {}",
                op, attr
            )))
        }
    }
}

/// Extract the standard attributes encoded by `filter`
///
/// Only an AND root or a single EQUAL is accepted. Comparisons on
/// `version_attributes` fold into OSGi range strings: `>=` gives an
/// inclusive start, `!>=` an exclusive end, `<=` an inclusive end, `!<=` an
/// exclusive start and `=` an exact range.
///
/// ```
/// use bllvm_resolver::filter::{extract_standard_attributes, FilterComponent};
///
/// let filter = FilterComponent::parse(
///     "(&(osgi.wiring.package=com.x)(version>=1.0.0)(!(version>=2.0.0)))",
/// ).unwrap();
/// let attrs = extract_standard_attributes(&filter, &["version"]).unwrap();
/// assert_eq!(attrs["version"], "[1.0.0,2.0.0)");
/// ```
pub fn extract_standard_attributes(
    filter: &FilterComponent,
    version_attributes: &[&str],
) -> Result<BTreeMap<String, String>, ResolverError> {
    if !matches!(filter, FilterComponent::And(_) | FilterComponent::Equal { .. }) {
        return Err(ResolverError::InvalidAttribute(format!(
            "invalid filter for standard attribute extraction: {}",
            filter
        )));
    }

    let mut extractor = Extractor {
        version_attributes,
        attributes: BTreeMap::new(),
        ranges: BTreeMap::new(),
    };
    extractor.process(filter, false)?;

    let mut attributes = extractor.attributes;
    for (attr, bounds) in extractor.ranges {
        if let Some(range) = bounds.into_range() {
            attributes.insert(attr, range);
        }
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION_ATTRS: &[&str] = &["version", "bundle-version"];

    fn extract(filter: &str) -> Result<BTreeMap<String, String>, ResolverError> {
        extract_standard_attributes(&FilterComponent::parse(filter).unwrap(), VERSION_ATTRS)
    }

    #[test]
    fn test_open_lower_bound() {
        let attrs = extract("(&(osgi.wiring.package=com.x)(version>=1.0.0))").unwrap();
        assert_eq!(attrs["osgi.wiring.package"], "com.x");
        assert_eq!(attrs["version"], "[1.0.0");
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_bounded_range() {
        let attrs = extract("(&(osgi.wiring.package=com.x)(version>=1.0.0)(!(version>=2.0.0)))").unwrap();
        assert_eq!(attrs["version"], "[1.0.0,2.0.0)");
    }

    #[test]
    fn test_less_forms() {
        let attrs = extract("(&(a=b)(!(version<=1.0))(version<=2.0))").unwrap();
        assert_eq!(attrs["version"], "(1.0,2.0]");
        let attrs = extract("(&(a=b)(version<=2.0))").unwrap();
        assert_eq!(attrs["version"], "[0.0.0,2.0]");
    }

    #[test]
    fn test_exact_version_and_single_equal_root() {
        let attrs = extract("(&(osgi.wiring.bundle=b)(bundle-version=1.2.3))").unwrap();
        assert_eq!(attrs["bundle-version"], "[1.2.3,1.2.3]");
        let attrs = extract("(osgi.wiring.bundle=b)").unwrap();
        assert_eq!(attrs["osgi.wiring.bundle"], "b");
    }

    #[test]
    fn test_duplicate_bounds_rejected() {
        let err = extract("(&(version>=1.0)(version>=1.5))").unwrap_err();
        assert!(err.to_string().contains("range start already defined"));
        let err = extract("(&(version<=1.0)(!(version>=1.5)))").unwrap_err();
        assert!(err.to_string().contains("range end already processed"));
        assert!(extract("(&(version=1.0)(version>=1.0))").is_err());
    }

    #[test]
    fn test_invalid_shapes() {
        let err = extract("(|(a=b)(c=d))").unwrap_err();
        assert!(err.to_string().contains("invalid filter for standard attribute extraction"));
        assert!(extract("(version>=1.0)").is_err());
        assert!(extract("(&(name>=x))").is_err());
        assert!(extract("(&(a=b)(|(c=d)(e=f)))").is_err());
        assert!(extract("(&(a=b)(!(c=d)))").is_err());
        assert!(extract("(&(a=b)(a=c))").is_err());
    }
}
