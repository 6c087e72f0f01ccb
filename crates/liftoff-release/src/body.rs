//! Release pull request bodies
//!
//! A body carries the release notes of every component in the pull
//! request. It is rendered when the pull request is opened and parsed back
//! once it is merged, so rendering and parsing must agree.

use std::sync::LazyLock;

use liftoff_core::Version;
use regex::Regex;
use tracing::debug;

/// Header line of every release pull request
pub const DEFAULT_HEADER: &str = ":robot: I have created a release *beep* *boop*";

/// Footer line of every release pull request
pub const DEFAULT_FOOTER: &str = "This PR was generated with Liftoff.";

const NOTES_DELIMITER: &str = "\n---\n";

static DETAILS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<details><summary>(?P<summary>.*?)</summary>(?P<notes>.*?)</details>")
        .expect("Invalid regex")
});

static SUMMARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<component>.*[^:]):? )?(?P<version>\d+\.\d+\.\d+.*)$")
        .expect("Invalid regex")
});

/// Version in a notes header such as `## [1.2.3](...)` or `## 1.2.3 (...)`
static NOTES_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#{2,3} \[?(?P<version>\d+\.\d+\.\d+[^\]\s]*)").expect("Invalid regex")
});

/// Release notes of one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseData {
    /// Component name, `None` for a component-less release
    pub component: Option<String>,
    /// Released version
    pub version: Option<Version>,
    /// Rendered notes
    pub notes: String,
}

/// Body of a release pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestBody {
    /// Text above the notes
    pub header: String,
    /// Release data, one entry per component
    pub releases: Vec<ReleaseData>,
    /// Text below the notes
    pub footer: String,
    /// Render single releases in a `<details>` block as well
    pub use_components: bool,
}

impl PullRequestBody {
    /// Create a body with the default header and footer
    pub fn new(releases: Vec<ReleaseData>, use_components: bool) -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            releases,
            footer: DEFAULT_FOOTER.to_string(),
            use_components,
        }
    }

    /// Render the notes part of the body
    pub fn notes(&self) -> String {
        if self.releases.len() > 1 || self.use_components {
            self.releases
                .iter()
                .map(|release| {
                    let component = release
                        .component
                        .as_deref()
                        .map(|c| format!("{}: ", c))
                        .unwrap_or_default();
                    let version = release
                        .version
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    format!(
                        "<details><summary>{}{}</summary>\n\n{}\n</details>",
                        component, version, release.notes
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        } else {
            self.releases
                .first()
                .map(|release| release.notes.clone())
                .unwrap_or_default()
        }
    }

    /// Parse a rendered body.
    ///
    /// Returns `None` when the body does not have the header, notes and
    /// footer layout.
    pub fn parse(body: &str) -> Option<Self> {
        let body = body.replace("\r\n", "\n");
        let first = body.find(NOTES_DELIMITER)?;
        let last = body.rfind(NOTES_DELIMITER)?;
        if first == last {
            debug!("body is missing a notes delimiter");
            return None;
        }

        let header = body[..first].to_string();
        let notes = body[first + NOTES_DELIMITER.len()..last].trim();
        let footer = body[last + NOTES_DELIMITER.len()..].to_string();

        let (releases, use_components) = if DETAILS_REGEX.is_match(notes) {
            (parse_details(notes), true)
        } else {
            let version = NOTES_VERSION_REGEX
                .captures(notes)
                .and_then(|caps| Version::parse(&caps["version"]).ok());
            let release = ReleaseData {
                component: None,
                version,
                notes: notes.to_string(),
            };
            (vec![release], false)
        };

        Some(Self {
            header,
            releases,
            footer,
            use_components,
        })
    }
}

impl std::fmt::Display for PullRequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}\n\n{}\n{}{}",
            self.header,
            NOTES_DELIMITER,
            self.notes(),
            NOTES_DELIMITER,
            self.footer
        )
    }
}

fn parse_details(notes: &str) -> Vec<ReleaseData> {
    DETAILS_REGEX
        .captures_iter(notes)
        .filter_map(|caps| {
            let summary = caps["summary"].trim();
            let Some(summary_caps) = SUMMARY_REGEX.captures(summary) else {
                debug!(summary, "release summary could not be parsed");
                return None;
            };
            Some(ReleaseData {
                component: summary_caps
                    .name("component")
                    .map(|m| m.as_str().to_string()),
                version: Version::parse(&summary_caps["version"]).ok(),
                notes: caps["notes"].trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(component: Option<&str>, version: Version, notes: &str) -> ReleaseData {
        ReleaseData {
            component: component.map(str::to_string),
            version: Some(version),
            notes: notes.to_string(),
        }
    }

    #[test]
    fn test_single_release_layout() {
        let body = PullRequestBody::new(
            vec![data(
                None,
                Version::new(1, 2, 3),
                "## [1.2.3](https://github.com/o/r/compare/v1.2.2...v1.2.3) (2024-01-02)\n\n\n### Bug Fixes\n\n* fix it",
            )],
            false,
        );
        let rendered = body.to_string();
        assert!(rendered.starts_with(":robot: I have created a release *beep* *boop*\n---\n\n\n## [1.2.3]"));
        assert!(rendered.ends_with("* fix it\n\n---\nThis PR was generated with Liftoff."));

        let parsed = PullRequestBody::parse(&rendered).unwrap();
        assert_eq!(parsed.releases, body.releases);
    }

    #[test]
    fn test_multiple_releases_round_trip() {
        let body = PullRequestBody::new(
            vec![
                data(Some("node1"), Version::new(3, 3, 4), "## [3.3.4](x) (2024-01-02)\n\n\n### Bug Fixes\n\n* a"),
                data(Some("node4"), Version::new(4, 4, 5), "## [4.4.5](x) (2024-01-02)\n\n\n### Bug Fixes\n\n* b"),
            ],
            true,
        );
        let rendered = body.to_string();
        assert!(rendered.contains("<details><summary>node1: 3.3.4</summary>"));
        assert!(rendered.contains("<details><summary>node4: 4.4.5</summary>"));

        assert_eq!(PullRequestBody::parse(&rendered).unwrap(), body);
    }

    #[test]
    fn test_component_names_with_colons_and_scopes() {
        let body = PullRequestBody::new(
            vec![data(Some("@scope/pkg"), Version::new(1, 0, 0).with_pre_release("rc.1"), "notes")],
            true,
        );
        let parsed = PullRequestBody::parse(&body.to_string()).unwrap();
        assert_eq!(parsed.releases[0].component.as_deref(), Some("@scope/pkg"));
        assert_eq!(parsed.releases[0].version.as_ref().unwrap().to_string(), "1.0.0-rc.1");
    }

    #[test]
    fn test_notes_with_horizontal_rule() {
        let body = PullRequestBody::new(
            vec![data(None, Version::new(2, 0, 0), "## 2.0.0 (2024-01-02)\n\nabove\n---\nbelow")],
            false,
        );
        let parsed = PullRequestBody::parse(&body.to_string()).unwrap();
        assert_eq!(parsed.releases, body.releases);
    }

    #[test]
    fn test_parse_rejects_free_text() {
        assert!(PullRequestBody::parse("just a description").is_none());
    }
}
