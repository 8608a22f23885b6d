//! Filter parsing, matching and standard attribute extraction

use bllvm_resolver::filter::{extract_standard_attributes, FilterComponent};
use bllvm_resolver::model::{AttributeValue, Attributes, Version};
use bllvm_resolver::ResolverError;

const VERSION_ATTRIBUTES: &[&str] = &["version", "bundle-version"];

fn package_attributes(name: &str, version: Version) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("osgi.wiring.package".into(), name.into());
    attrs.insert("version".into(), AttributeValue::Version(version));
    attrs
}

#[test]
fn test_extract_open_lower_bound() {
    let filter = FilterComponent::parse("(&(osgi.wiring.package=com.x)(version>=1.0.0))").unwrap();
    let attrs = extract_standard_attributes(&filter, VERSION_ATTRIBUTES).unwrap();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs["osgi.wiring.package"], "com.x");
    assert_eq!(attrs["version"], "[1.0.0");
}

#[test]
fn test_extract_bounded_range() {
    let filter =
        FilterComponent::parse("(&(osgi.wiring.package=com.x)(version>=1.0.0)(!(version>=2.0.0)))").unwrap();
    let attrs = extract_standard_attributes(&filter, VERSION_ATTRIBUTES).unwrap();
    assert_eq!(attrs["version"], "[1.0.0,2.0.0)");
}

#[test]
fn test_extract_exact_and_end_only() {
    let exact = FilterComponent::parse("(&(osgi.wiring.bundle=b)(bundle-version=1.2.3))").unwrap();
    let attrs = extract_standard_attributes(&exact, VERSION_ATTRIBUTES).unwrap();
    assert_eq!(attrs["bundle-version"], "[1.2.3,1.2.3]");

    let end_only = FilterComponent::parse("(&(osgi.wiring.bundle=b)(bundle-version<=3.0.0))").unwrap();
    let attrs = extract_standard_attributes(&end_only, VERSION_ATTRIBUTES).unwrap();
    assert_eq!(attrs["bundle-version"], "[0.0.0,3.0.0]");
}

#[test]
fn test_extract_single_equal_root() {
    let filter = FilterComponent::parse("(osgi.wiring.package=com.x)").unwrap();
    let attrs = extract_standard_attributes(&filter, VERSION_ATTRIBUTES).unwrap();
    assert_eq!(attrs.len(), 1);
}

#[test]
fn test_extract_rejects_bad_shapes() {
    let or_root = FilterComponent::parse("(|(a=b)(c=d))").unwrap();
    assert!(matches!(
        extract_standard_attributes(&or_root, VERSION_ATTRIBUTES),
        Err(ResolverError::InvalidAttribute(msg)) if msg.contains("invalid filter for standard attribute extraction")
    ));

    let two_starts = FilterComponent::parse("(&(p=x)(version>=1.0)(version>=2.0))").unwrap();
    assert!(matches!(
        extract_standard_attributes(&two_starts, VERSION_ATTRIBUTES),
        Err(ResolverError::InvalidAttribute(_))
    ));

    let not_a_version = FilterComponent::parse("(&(p=x)(size>=10))").unwrap();
    assert!(extract_standard_attributes(&not_a_version, VERSION_ATTRIBUTES).is_err());
}

#[test]
fn test_parse_errors_report_position() {
    let cases = [
        ("(a=b", "missing ')'"),
        ("a=b)", "missing '('"),
        ("(a=b))", "extraneous trailing characters"),
        ("(=b)", "missing attribute name"),
        ("(ab)", "missing or invalid operator"),
        ("(a=)", "missing value"),
        ("(&)", "missing '(' in filter list"),
    ];
    for (input, expected) in cases {
        let err = FilterComponent::parse(input).unwrap_err();
        assert!(
            err.message.contains(expected),
            "{}: expected {:?}, got {:?}",
            input,
            expected,
            err.message
        );
        assert!(err.position <= input.chars().count());
        assert_eq!(err.filter, input);
    }
}

#[test]
fn test_escaped_value_matches_literally() {
    let filter = FilterComponent::parse("(name=a\\*b\\(c\\))").unwrap();
    let mut attrs = Attributes::new();
    attrs.insert("name".into(), "a*b(c)".into());
    assert!(filter.matches(&attrs));

    attrs.insert("name".into(), "aXb(c)".into());
    assert!(!filter.matches(&attrs));
}

#[test]
fn test_version_typed_matching() {
    let filter = FilterComponent::parse("(&(osgi.wiring.package=com.x)(version>=1.0.0)(!(version>=2.0.0)))").unwrap();
    assert!(filter.matches(&package_attributes("com.x", Version::new(1, 10, 0))));
    assert!(!filter.matches(&package_attributes("com.x", Version::new(2, 0, 0))));
    assert!(!filter.matches(&package_attributes("com.y", Version::new(1, 0, 0))));
}

#[test]
fn test_missing_attribute_only_matches_under_not() {
    let attrs = Attributes::new();
    assert!(!FilterComponent::parse("(a=b)").unwrap().matches(&attrs));
    assert!(FilterComponent::parse("(!(a=b))").unwrap().matches(&attrs));
}

#[test]
fn test_long_and_list_matching() {
    let mut attrs = Attributes::new();
    attrs.insert("slots".into(), AttributeValue::Long(8));
    attrs.insert("tags".into(), AttributeValue::List(vec!["fast".into(), "small".into()]));

    assert!(FilterComponent::parse("(slots>=4)").unwrap().matches(&attrs));
    assert!(!FilterComponent::parse("(slots<=4)").unwrap().matches(&attrs));
    assert!(FilterComponent::parse("(tags=small)").unwrap().matches(&attrs));
    assert!(FilterComponent::parse("(TAGS~=FA ST)").unwrap().matches(&attrs));
}
