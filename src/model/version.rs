//! Versions and version ranges
//!
//! Versions are `major[.minor[.micro[.qualifier]]]`. Missing numeric parts are
//! zero and the qualifier compares lexically, so `1.0` == `1.0.0` and
//! `1.0.0` < `1.0.0.beta`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResolverError;

/// Module version
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u64,
    minor: u64,
    micro: u64,
    qualifier: String,
}

impl Version {
    /// Create a version without qualifier
    pub const fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// The `0.0.0` version
    pub const fn empty() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn micro(&self) -> u64 {
        self.micro
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// Parse a version string
    ///
    /// Surrounding whitespace is ignored; an empty string is `0.0.0`.
    pub fn parse(input: &str) -> Result<Self, ResolverError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numbers = [0u64; 3];
        for (i, slot) in numbers.iter_mut().enumerate() {
            match parts.next() {
                Some(part) => {
                    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                        return Err(ResolverError::InvalidVersion(format!(
                            "{} (component {} is not numeric)",
                            input,
                            i + 1
                        )));
                    }
                    *slot = part.parse::<u64>().map_err(|e| {
                        ResolverError::InvalidVersion(format!("{}: {}", input, e))
                    })?;
                }
                None => break,
            }
        }

        let qualifier = parts.next().unwrap_or_default();
        if !qualifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ResolverError::InvalidVersion(format!(
                "{} (invalid qualifier)",
                input
            )));
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            micro: numbers[2],
            qualifier: qualifier.to_string(),
        })
    }
}

impl FromStr for Version {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ResolverError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

/// Version interval
///
/// `right == None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    left: Version,
    left_closed: bool,
    right: Option<Version>,
    right_closed: bool,
}

impl VersionRange {
    /// `[version,∞)`
    pub fn at_least(version: Version) -> Self {
        Self {
            left: version,
            left_closed: true,
            right: None,
            right_closed: false,
        }
    }

    /// `[version,version]`
    pub fn exact(version: Version) -> Self {
        Self {
            left: version.clone(),
            left_closed: true,
            right: Some(version),
            right_closed: true,
        }
    }

    /// Every version
    pub fn any() -> Self {
        Self::at_least(Version::empty())
    }

    /// Build an explicit interval
    pub fn between(left: Version, left_closed: bool, right: Version, right_closed: bool) -> Self {
        Self {
            left,
            left_closed,
            right: Some(right),
            right_closed,
        }
    }

    pub fn left(&self) -> &Version {
        &self.left
    }

    pub fn right(&self) -> Option<&Version> {
        self.right.as_ref()
    }

    /// Parse a range string
    ///
    /// Accepts `[a,b]`, `(a,b)`, `[a,b)`, `(a,b]`, a bare version (at least),
    /// and the half-open forms `[a` and `(a`.
    pub fn parse(input: &str) -> Result<Self, ResolverError> {
        let s = input.trim();
        let invalid = |why: &str| ResolverError::InvalidVersion(format!("range {}: {}", input, why));

        let left_closed = match s.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Ok(Self::at_least(Version::parse(s)?)),
        };
        let body = &s[1..];

        match body.find(',') {
            None => {
                if body.ends_with(']') || body.ends_with(')') {
                    return Err(invalid("missing ','"));
                }
                Ok(Self {
                    left: Version::parse(body)?,
                    left_closed,
                    right: None,
                    right_closed: false,
                })
            }
            Some(comma) => {
                let right_closed = if body.ends_with(']') {
                    true
                } else if body.ends_with(')') {
                    false
                } else {
                    return Err(invalid("missing closing ']' or ')'"));
                };
                let left = Version::parse(&body[..comma])?;
                let right = Version::parse(&body[comma + 1..body.len() - 1])?;
                Ok(Self {
                    left,
                    left_closed,
                    right: Some(right),
                    right_closed,
                })
            }
        }
    }

    /// Whether `version` lies inside the interval
    pub fn includes(&self, version: &Version) -> bool {
        let above_left = if self.left_closed {
            *version >= self.left
        } else {
            *version > self.left
        };
        if !above_left {
            return false;
        }
        match &self.right {
            None => true,
            Some(right) if self.right_closed => version <= right,
            Some(right) => version < right,
        }
    }

    /// Whether no version can satisfy the interval
    pub fn is_empty(&self) -> bool {
        match &self.right {
            None => false,
            Some(right) => {
                if self.left == *right {
                    !(self.left_closed && self.right_closed)
                } else {
                    self.left > *right
                }
            }
        }
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}

impl FromStr for VersionRange {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = ResolverError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.right {
            None if self.left_closed => write!(f, "{}", self.left),
            None => write!(f, "({}", self.left),
            Some(right) => write!(
                f,
                "{}{},{}{}",
                if self.left_closed { '[' } else { '(' },
                self.left,
                right,
                if self.right_closed { ']' } else { ')' }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_version_parse_and_order() {
        assert_eq!(v("1"), Version::new(1, 0, 0));
        assert_eq!(v("1.2"), v("1.2.0"));
        assert_eq!(v(" 1.2.3 ").to_string(), "1.2.3");
        assert_eq!(v("").to_string(), "0.0.0");
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("1.0.0.beta") > v("1.0.0"));
        assert!(v("1.0.0.alpha") < v("1.0.0.beta"));
    }

    #[test]
    fn test_version_parse_errors() {
        assert!(Version::parse("1.x").is_err());
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse("1.0.0.bad qualifier").is_err());
    }

    #[test]
    fn test_range_forms() {
        let r = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(r.includes(&v("1.0.0")));
        assert!(r.includes(&v("1.9.9")));
        assert!(!r.includes(&v("2.0.0")));

        let r = VersionRange::parse("(1.0,2.0]").unwrap();
        assert!(!r.includes(&v("1.0.0")));
        assert!(r.includes(&v("2.0.0")));

        let r = VersionRange::parse("1.5").unwrap();
        assert!(r.includes(&v("99.0")));
        assert!(!r.includes(&v("1.4.9")));
    }

    #[test]
    fn test_half_open_ranges() {
        let r = VersionRange::parse("[1.0.0").unwrap();
        assert!(r.includes(&v("1.0.0")));
        assert!(r.includes(&v("3.0.0")));

        let r = VersionRange::parse("(1.0.0").unwrap();
        assert!(!r.includes(&v("1.0.0")));
        assert!(r.includes(&v("1.0.1")));
        assert_eq!(r.to_string(), "(1.0.0");

        assert!(VersionRange::parse("[1.0.0]").is_err());
        assert!(VersionRange::parse("[1.0,2.0").is_err());
    }

    #[test]
    fn test_empty_range() {
        assert!(VersionRange::parse("[2.0,1.0]").unwrap().is_empty());
        assert!(VersionRange::parse("[1.0,1.0)").unwrap().is_empty());
        assert!(!VersionRange::exact(v("1.0")).is_empty());
    }
}
