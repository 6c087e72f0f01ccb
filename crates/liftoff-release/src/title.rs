//! Release pull request titles

use std::fmt;

use liftoff_core::config::{DEFAULT_GROUP_TITLE_PATTERN, DEFAULT_TITLE_PATTERN};
use liftoff_core::Version;
use regex::Regex;
use tracing::debug;

/// A release pull request title rendered from a pattern.
///
/// Patterns understand `${scope}` (`(<branch>)`), `${component}`
/// (` <component>`), `${version}` and `${branch}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestTitle {
    /// Component being released
    pub component: Option<String>,
    /// Branch the release targets
    pub target_branch: Option<String>,
    /// Version being released
    pub version: Option<Version>,
    /// Pattern the title is rendered from
    pub pattern: String,
}

impl PullRequestTitle {
    /// Title of a single-component release
    pub fn of_component_target_branch_version(
        component: Option<&str>,
        target_branch: &str,
        version: Version,
        pattern: Option<&str>,
    ) -> Self {
        Self {
            component: component.filter(|c| !c.is_empty()).map(str::to_string),
            target_branch: Some(target_branch.to_string()),
            version: Some(version),
            pattern: pattern.unwrap_or(DEFAULT_TITLE_PATTERN).to_string(),
        }
    }

    /// Title of a merged release covering several components
    pub fn of_target_branch(target_branch: &str, pattern: Option<&str>) -> Self {
        Self {
            component: None,
            target_branch: Some(target_branch.to_string()),
            version: None,
            pattern: pattern.unwrap_or(DEFAULT_GROUP_TITLE_PATTERN).to_string(),
        }
    }

    /// Parse a title rendered from `pattern`
    pub fn parse(title: &str, pattern: &str) -> Option<Self> {
        let regex = match_pattern(pattern)?;
        let caps = regex.captures(title)?;

        let version = match caps.name("version") {
            Some(m) => Some(Version::parse(m.as_str().trim()).ok()?),
            None => None,
        };
        let target_branch = caps
            .name("branch")
            .or_else(|| caps.name("scope_branch"))
            .map(|m| m.as_str().to_string());

        Some(Self {
            component: caps
                .name("component")
                .map(|m| m.as_str().to_string())
                .filter(|c| !c.is_empty()),
            target_branch,
            version,
            pattern: pattern.to_string(),
        })
    }
}

impl fmt::Display for PullRequestTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self
            .target_branch
            .as_deref()
            .map(|branch| format!("({})", branch))
            .unwrap_or_default();
        let component = self
            .component
            .as_deref()
            .map(|component| format!(" {}", component))
            .unwrap_or_default();
        let version = self
            .version
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        let title = self
            .pattern
            .replace("${scope}", &scope)
            .replace("${component}", &component)
            .replace("${version}", &version)
            .replace("${branch}", self.target_branch.as_deref().unwrap_or_default());
        f.write_str(title.trim())
    }
}

/// Build a matching regex from a title pattern.
///
/// Literal text is escaped; placeholders become named groups. `${branch}`
/// and `${scope}` may both appear, so they capture into separate groups.
fn match_pattern(pattern: &str) -> Option<Regex> {
    let mut regex = String::from("^");
    let mut rest = pattern;

    while let Some(start) = rest.find("${") {
        regex.push_str(&regex::escape(&rest[..start]));
        let end = rest[start..].find('}')? + start;
        let placeholder = &rest[start + 2..end];
        let group = match placeholder {
            "scope" => r"(?:\((?P<scope_branch>[\w\-./]+)\))?",
            "component" => r" ?(?P<component>@?[\w\-./]*)?",
            "version" => r"v?(?P<version>[0-9].*)",
            "branch" => r"(?P<branch>[\w\-./]+)?",
            other => {
                debug!(placeholder = other, "unknown title placeholder");
                return None;
            }
        };
        regex.push_str(group);
        rest = &rest[end + 1..];
    }
    regex.push_str(&regex::escape(rest));
    regex.push('$');

    Regex::new(&regex).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_component_title() {
        let title = PullRequestTitle::of_component_target_branch_version(
            Some("some-node-package"),
            "main",
            Version::new(0, 123, 5),
            None,
        );
        assert_eq!(
            title.to_string(),
            "chore(main): release some-node-package 0.123.5"
        );
    }

    #[test]
    fn test_render_without_component() {
        let title = PullRequestTitle::of_component_target_branch_version(
            None,
            "main",
            Version::new(1, 0, 0),
            None,
        );
        assert_eq!(title.to_string(), "chore(main): release 1.0.0");
    }

    #[test]
    fn test_render_group_title() {
        let title = PullRequestTitle::of_target_branch("main", None);
        assert_eq!(title.to_string(), "chore: release main");
    }

    #[test]
    fn test_parse_component_title() {
        let title = PullRequestTitle::parse(
            "chore(main): release some-node-package 0.123.5",
            DEFAULT_TITLE_PATTERN,
        )
        .unwrap();
        assert_eq!(title.component.as_deref(), Some("some-node-package"));
        assert_eq!(title.target_branch.as_deref(), Some("main"));
        assert_eq!(title.version, Some(Version::new(0, 123, 5)));
    }

    #[test]
    fn test_parse_plain_title() {
        let title = PullRequestTitle::parse("chore: release 2.0.0-beta.1", DEFAULT_TITLE_PATTERN)
            .unwrap();
        assert_eq!(title.component, None);
        assert_eq!(title.target_branch, None);
        assert_eq!(title.version.unwrap().to_string(), "2.0.0-beta.1");
    }

    #[test]
    fn test_parse_group_title() {
        let title =
            PullRequestTitle::parse("chore: release main", DEFAULT_GROUP_TITLE_PATTERN).unwrap();
        assert_eq!(title.target_branch.as_deref(), Some("main"));
        assert_eq!(title.version, None);
    }

    #[test]
    fn test_parse_custom_pattern() {
        let pattern = "release: ${component} v${version} [skip ci]";
        let title = PullRequestTitle::parse("release: @scope/pkg v1.2.3 [skip ci]", pattern).unwrap();
        assert_eq!(title.component.as_deref(), Some("@scope/pkg"));
        assert_eq!(title.version, Some(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_parse_rejects_other_titles() {
        assert!(PullRequestTitle::parse("feat: add things", DEFAULT_TITLE_PATTERN).is_none());
    }
}
