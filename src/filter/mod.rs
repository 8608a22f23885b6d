//! LDAP-style filter expressions (RFC 1960)
//!
//! Filters describe which capabilities satisfy a requirement:
//!
//! ```
//! use bllvm_resolver::filter::FilterComponent;
//! use bllvm_resolver::model::{Attributes, AttributeValue, Version};
//!
//! let filter = FilterComponent::parse("(&(osgi.wiring.package=com.x)(version>=1.0.0))").unwrap();
//! let mut attrs = Attributes::new();
//! attrs.insert("osgi.wiring.package".into(), "com.x".into());
//! attrs.insert("version".into(), AttributeValue::Version(Version::new(1, 2, 0)));
//! assert!(filter.matches(&attrs));
//! ```

mod matcher;
mod parser;
mod standard;

use std::fmt;

pub use parser::parse;
pub use standard::extract_standard_attributes;

/// Parsed filter tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterComponent {
    /// `(attr=value)`
    Equal { attr: String, value: String },
    /// `(attr~=value)`
    Approx { attr: String, value: String },
    /// `(attr>=value)`
    Greater { attr: String, value: String },
    /// `(attr<=value)`
    Less { attr: String, value: String },
    /// `(attr=*)`
    Present { attr: String },
    /// `(attr=a*b*c)`; empty first/last parts mean an unanchored edge
    Substring { attr: String, parts: Vec<String> },
    And(Vec<FilterComponent>),
    Or(Vec<FilterComponent>),
    Not(Box<FilterComponent>),
}

impl FilterComponent {
    /// Parse a filter string
    pub fn parse(filter: &str) -> Result<Self, crate::error::FilterParseError> {
        parser::parse(filter)
    }

    /// Negate this filter
    pub fn negate(self) -> Self {
        FilterComponent::Not(Box::new(self))
    }
}

// Edge whitespace is escaped because the parser strips it otherwise.
fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str, leading: bool, trailing: bool) -> fmt::Result {
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        let edge = (leading && i == 0) || (trailing && i == last);
        if matches!(c, '\\' | '(' | ')' | '*') || (edge && c.is_whitespace()) {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

impl fmt::Display for FilterComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterComponent::Equal { attr, value } => {
                write!(f, "({}=", attr)?;
                write_escaped(f, value, true, true)?;
                f.write_str(")")
            }
            FilterComponent::Approx { attr, value } => {
                write!(f, "({}~=", attr)?;
                write_escaped(f, value, true, true)?;
                f.write_str(")")
            }
            FilterComponent::Greater { attr, value } => {
                write!(f, "({}>=", attr)?;
                write_escaped(f, value, true, true)?;
                f.write_str(")")
            }
            FilterComponent::Less { attr, value } => {
                write!(f, "({}<=", attr)?;
                write_escaped(f, value, true, true)?;
                f.write_str(")")
            }
            FilterComponent::Present { attr } => write!(f, "({}=*)", attr),
            FilterComponent::Substring { attr, parts } => {
                write!(f, "({}=", attr)?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write_escaped(f, part, i == 0, i + 1 == parts.len())?;
                }
                f.write_str(")")
            }
            FilterComponent::And(children) => {
                f.write_str("(&")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            FilterComponent::Or(children) => {
                f.write_str("(|")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            FilterComponent::Not(child) => write!(f, "(!{})", child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_normalizes_whitespace_and_escapes() {
        let filter = parse(" ( & (a = x\\(y\\) ) (| (b>=1) (!(c<=2)) ) (d=*) (e=a*b) ) ").unwrap();
        assert_eq!(filter.to_string(), "(&(a=x\\(y\\))(|(b>=1)(!(c<=2)))(d=*)(e=a*b))");
        assert_eq!(parse(&filter.to_string()).unwrap(), filter);
    }

    #[test]
    fn test_edge_whitespace_round_trips() {
        let filter = FilterComponent::Equal {
            attr: "a".into(),
            value: " x ".into(),
        };
        assert_eq!(filter.to_string(), "(a=\\ x\\ )");
        assert_eq!(parse(&filter.to_string()).unwrap(), filter);
    }

    #[test]
    fn test_escaped_star_is_literal() {
        let filter = parse("(a=x\\*y)").unwrap();
        assert_eq!(
            filter,
            FilterComponent::Equal {
                attr: "a".into(),
                value: "x*y".into()
            }
        );
        assert_eq!(filter.to_string(), "(a=x\\*y)");
    }
}
