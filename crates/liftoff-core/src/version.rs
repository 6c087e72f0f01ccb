//! Semantic version value

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VersionError;

/// Map of package/artifact name to version, used by multi-artifact ecosystems
pub type VersionsMap = BTreeMap<String, Version>;

/// An immutable semantic version
///
/// Ordering compares major, minor and patch numerically, then the pre-release
/// tag: a version without a pre-release sorts above the same version with
/// one, and two pre-release tags compare lexicographically. Build metadata
/// only breaks ties so that `Ord` agrees with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    /// Major version
    pub major: u64,
    /// Minor version
    pub minor: u64,
    /// Patch version
    pub patch: u64,
    /// Pre-release identifier
    pub pre_release: Option<String>,
    /// Build metadata
    pub build: Option<String>,
}

impl Version {
    /// Create a new version without pre-release or build metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
            build: None,
        }
    }

    /// Parse a `MAJOR.MINOR.PATCH[-pre][+build]` string
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let trimmed = version.trim();
        let parsed = semver::Version::parse(trimmed)
            .map_err(|e| VersionError::Parse(version.to_string(), e.to_string()))?;

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre_release: if parsed.pre.is_empty() {
                None
            } else {
                Some(parsed.pre.to_string())
            },
            build: if parsed.build.is_empty() {
                None
            } else {
                Some(parsed.build.to_string())
            },
        })
    }

    /// Return a copy with the given pre-release identifier
    pub fn with_pre_release(mut self, pre_release: impl Into<String>) -> Self {
        self.pre_release = Some(pre_release.into());
        self
    }

    /// Return a copy with the given build metadata
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// Return a copy without a pre-release identifier
    pub fn without_pre_release(mut self) -> Self {
        self.pre_release = None;
        self
    }

    /// Whether this version is below 1.0.0
    pub fn is_pre_major(&self) -> bool {
        self.major < 1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
        assert!(v.pre_release.is_none());
        assert!(v.build.is_none());
    }

    #[test]
    fn test_parse_full() {
        let v = Version::parse("2.0.0-beta.1+build.7").unwrap();
        assert_eq!(v.pre_release.as_deref(), Some("beta.1"));
        assert_eq!(v.build.as_deref(), Some("build.7"));
        assert_eq!(v.to_string(), "2.0.0-beta.1+build.7");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Version::parse("1.2"),
            Err(VersionError::Parse(_, _))
        ));
        assert!(Version::parse("1.2.3-").is_err());
        assert!(Version::parse("not-a-version").is_err());
    }

    #[test]
    fn test_ordering() {
        let a = Version::parse("1.0.0-alpha").unwrap();
        let b = Version::parse("1.0.0").unwrap();
        let c = Version::parse("1.0.1").unwrap();
        let d = Version::parse("1.0.0-beta").unwrap();

        assert!(a < b);
        assert!(b < c);
        assert!(a < d);
        assert!(d < b);
        assert!(Version::new(0, 10, 0) > Version::new(0, 9, 99));
    }

    #[test]
    fn test_serde_as_string() {
        let v: Version = serde_json::from_str("\"3.3.4\"").unwrap();
        assert_eq!(v, Version::new(3, 3, 4));
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"3.3.4\"");
    }
}
