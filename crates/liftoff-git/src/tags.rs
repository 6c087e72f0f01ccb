//! Release tag naming

use std::fmt;
use std::sync::LazyLock;

use liftoff_core::Version;
use regex::Regex;

/// `[component<separator>][v]MAJOR.MINOR.PATCH[...]`
///
/// The component match is greedy, so the separator is the last non
/// alphanumeric character before the version core.
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<component>.*)(?P<separator>[^a-zA-Z0-9]))?(?P<v>v)?(?P<version>\d+\.\d+\.\d+.*)$",
    )
    .expect("Invalid regex")
});

/// A release tag: optional component, separator, optional `v`, version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagName {
    /// Component prefix
    pub component: Option<String>,
    /// Separator between component and version
    pub separator: String,
    /// Whether the version is prefixed with `v`
    pub include_v: bool,
    /// Released version
    pub version: Version,
}

impl TagName {
    /// Create a tag name
    pub fn new(
        version: Version,
        component: Option<&str>,
        separator: &str,
        include_v: bool,
    ) -> Self {
        Self {
            component: component.filter(|c| !c.is_empty()).map(str::to_string),
            separator: separator.to_string(),
            include_v,
            version,
        }
    }

    /// Parse a tag name, returning `None` when it does not carry a version
    pub fn parse(tag: &str) -> Option<Self> {
        let caps = TAG_REGEX.captures(tag)?;
        let version = Version::parse(caps.name("version")?.as_str()).ok()?;
        let component = caps
            .name("component")
            .map(|m| m.as_str().to_string())
            .filter(|c| !c.is_empty());

        Some(Self {
            separator: caps
                .name("separator")
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "-".to_string()),
            component,
            include_v: caps.name("v").is_some(),
            version,
        })
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(component) = &self.component {
            write!(f, "{}{}", component, self.separator)?;
        }
        if self.include_v {
            write!(f, "v")?;
        }
        write!(f, "{}", self.version)
    }
}
