//! Filter evaluation against capability attributes
//!
//! Comparison is driven by the type of the attribute value: versions compare
//! as versions, longs numerically, strings lexically, and a list matches when
//! any element does.

use std::cmp::Ordering;

use super::FilterComponent;
use crate::model::{AttributeValue, Attributes, Version};

#[derive(Clone, Copy)]
enum Op {
    Equal,
    Approx,
    Greater,
    Less,
}

impl FilterComponent {
    /// Evaluate this filter against an attribute map
    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            FilterComponent::And(children) => children.iter().all(|c| c.matches(attributes)),
            FilterComponent::Or(children) => children.iter().any(|c| c.matches(attributes)),
            FilterComponent::Not(child) => !child.matches(attributes),
            FilterComponent::Present { attr } => lookup(attributes, attr).is_some(),
            FilterComponent::Substring { attr, parts } => match lookup(attributes, attr) {
                Some(AttributeValue::String(s)) => substring_matches(s, parts),
                Some(AttributeValue::List(items)) => items.iter().any(|s| substring_matches(s, parts)),
                Some(other) => substring_matches(&other.to_string(), parts),
                None => false,
            },
            FilterComponent::Equal { attr, value } => compare(attributes, attr, value, Op::Equal),
            FilterComponent::Approx { attr, value } => compare(attributes, attr, value, Op::Approx),
            FilterComponent::Greater { attr, value } => compare(attributes, attr, value, Op::Greater),
            FilterComponent::Less { attr, value } => compare(attributes, attr, value, Op::Less),
        }
    }
}

/// Exact key first, then case-insensitive
fn lookup<'a>(attributes: &'a Attributes, attr: &str) -> Option<&'a AttributeValue> {
    attributes.get(attr).or_else(|| {
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(attr))
            .map(|(_, v)| v)
    })
}

fn compare(attributes: &Attributes, attr: &str, value: &str, op: Op) -> bool {
    match lookup(attributes, attr) {
        None => false,
        Some(AttributeValue::String(s)) => compare_strings(s, value, op),
        Some(AttributeValue::List(items)) => items.iter().any(|s| compare_strings(s, value, op)),
        Some(AttributeValue::Version(v)) => match Version::parse(value) {
            Ok(other) => ordering_matches(v.cmp(&other), op),
            Err(_) => false,
        },
        Some(AttributeValue::Long(n)) => match value.trim().parse::<i64>() {
            Ok(other) => ordering_matches(n.cmp(&other), op),
            Err(_) => false,
        },
    }
}

fn compare_strings(actual: &str, value: &str, op: Op) -> bool {
    match op {
        Op::Approx => normalize(actual) == normalize(value),
        _ => ordering_matches(actual.cmp(value), op),
    }
}

fn ordering_matches(ordering: Ordering, op: Op) -> bool {
    match op {
        Op::Equal | Op::Approx => ordering == Ordering::Equal,
        Op::Greater => ordering != Ordering::Less,
        Op::Less => ordering != Ordering::Greater,
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn substring_matches(value: &str, parts: &[String]) -> bool {
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return value == first,
    };

    if !value.starts_with(first.as_str()) {
        return false;
    }
    let mut remaining = &value[first.len()..];
    for part in middle {
        match remaining.find(part.as_str()) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("osgi.wiring.package".into(), "com.example.api".into());
        attrs.insert("version".into(), AttributeValue::Version(Version::new(1, 5, 0)));
        attrs.insert("ranking".into(), AttributeValue::Long(10));
        attrs.insert(
            "platforms".into(),
            AttributeValue::List(vec!["linux".into(), "macos".into()]),
        );
        attrs.insert("Vendor".into(), "Bitcoin Commons".into());
        attrs
    }

    fn check(filter: &str) -> bool {
        FilterComponent::parse(filter).unwrap().matches(&attrs())
    }

    #[test]
    fn test_version_comparisons() {
        assert!(check("(version>=1.0)"));
        assert!(check("(version<=1.5.0)"));
        assert!(!check("(version>=2.0)"));
        assert!(check("(version=1.5)"));
        assert!(!check("(version=banana)"));
    }

    #[test]
    fn test_long_comparisons() {
        assert!(check("(ranking>=5)"));
        assert!(!check("(ranking<=5)"));
        assert!(check("(ranking= 10 )"));
    }

    #[test]
    fn test_string_list_and_case() {
        assert!(check("(osgi.wiring.package=com.example.api)"));
        assert!(check("(platforms=macos)"));
        assert!(!check("(platforms=windows)"));
        assert!(check("(vendor=Bitcoin Commons)"));
        assert!(check("(vendor~=bitcoincommons)"));
        assert!(!check("(missing=x)"));
        assert!(check("(!(missing=x))"));
    }

    #[test]
    fn test_substring_and_presence() {
        assert!(check("(osgi.wiring.package=com.*)"));
        assert!(check("(osgi.wiring.package=*example*)"));
        assert!(check("(osgi.wiring.package=com*api)"));
        assert!(!check("(osgi.wiring.package=*impl)"));
        assert!(check("(platforms=lin*)"));
        assert!(check("(ranking=*)"));
        assert!(!check("(missing=*)"));
    }

    #[test]
    fn test_substring_does_not_overlap() {
        assert!(!substring_matches("ab", &["ab".into(), "b".into()]));
        assert!(substring_matches("abb", &["ab".into(), "b".into()]));
    }
}
