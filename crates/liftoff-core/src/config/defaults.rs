//! Default configuration values

use super::types::ChangelogSection;

/// Default manifest configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "liftoff-config.json";

/// Default released-versions manifest file name
pub const DEFAULT_MANIFEST_FILE: &str = ".liftoff-manifest.json";

/// Default changelog path
pub const DEFAULT_CHANGELOG_PATH: &str = "CHANGELOG.md";

/// Default pull request title pattern
pub const DEFAULT_TITLE_PATTERN: &str = "chore${scope}: release${component} ${version}";

/// Default title pattern for merged pull requests
pub const DEFAULT_GROUP_TITLE_PATTERN: &str = "chore: release ${branch}";

/// Labels added to open release pull requests
pub const DEFAULT_LABELS: &[&str] = &["autorelease: pending"];

/// Labels added to release pull requests once tagged
pub const DEFAULT_RELEASE_LABELS: &[&str] = &["autorelease: tagged"];

/// Number of releases inspected when looking for the latest release per path
pub const DEFAULT_RELEASE_SEARCH_DEPTH: usize = 400;

/// Number of commits inspected when collecting unreleased commits
pub const DEFAULT_COMMIT_SEARCH_DEPTH: usize = 500;

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![DEFAULT_CONFIG_FILE, ".github/liftoff-config.json"]
}

/// Conventional changelog sections
pub fn default_changelog_sections() -> Vec<ChangelogSection> {
    vec![
        ChangelogSection::new("feat", "Features"),
        ChangelogSection::new("feature", "Features"),
        ChangelogSection::new("fix", "Bug Fixes"),
        ChangelogSection::new("perf", "Performance Improvements"),
        ChangelogSection::new("revert", "Reverts"),
        ChangelogSection::hidden("docs", "Documentation"),
        ChangelogSection::hidden("style", "Styles"),
        ChangelogSection::hidden("chore", "Miscellaneous Chores"),
        ChangelogSection::hidden("refactor", "Code Refactoring"),
        ChangelogSection::hidden("test", "Tests"),
        ChangelogSection::hidden("build", "Build System"),
        ChangelogSection::hidden("ci", "Continuous Integration"),
    ]
}
