#![no_main]
use bllvm_resolver::filter::{extract_standard_attributes, FilterComponent};
use bllvm_resolver::model::{AttributeValue, Attributes, Version};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let filter = match FilterComponent::parse(input) {
        Ok(filter) => filter,
        Err(e) => {
            // Errors must point inside the input
            assert!(e.position <= input.chars().count());
            return;
        }
    };

    // Printed filters must parse back to the same tree
    let printed = filter.to_string();
    let reparsed = FilterComponent::parse(&printed).expect("printed filter must parse");
    assert_eq!(reparsed, filter);

    let mut attrs = Attributes::new();
    attrs.insert("osgi.wiring.package".into(), "com.example".into());
    attrs.insert("version".into(), AttributeValue::Version(Version::new(1, 2, 3)));
    attrs.insert("size".into(), AttributeValue::Long(42));
    let _ = filter.matches(&attrs);
    let _ = extract_standard_attributes(&filter, &["version", "bundle-version"]);
});
