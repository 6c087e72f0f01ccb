//! Configuration types

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ReleaseType, VersioningKind};

use super::defaults::{
    default_changelog_sections, DEFAULT_CHANGELOG_PATH, DEFAULT_COMMIT_SEARCH_DEPTH,
    DEFAULT_GROUP_TITLE_PATTERN, DEFAULT_LABELS, DEFAULT_RELEASE_LABELS,
    DEFAULT_RELEASE_SEARCH_DEPTH, DEFAULT_TITLE_PATTERN,
};

/// Top-level manifest configuration (`liftoff-config.json`)
///
/// Top-level releaser keys act as defaults for every entry in `packages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ManifestConfig {
    /// Defaults applied to every tracked path
    #[serde(flatten)]
    pub defaults: ReleaserConfig,

    /// Per-path overrides keyed by repository-relative path
    pub packages: BTreeMap<String, ReleaserConfig>,

    /// Plugins run after candidates are built, in order
    #[serde(deserialize_with = "deserialize_plugins")]
    pub plugins: Vec<PluginConfig>,

    /// Open one pull request per component instead of a merged one
    pub separate_pull_requests: bool,

    /// Title pattern for merged pull requests
    pub group_pull_request_title_pattern: Option<String>,

    /// Labels added to open release pull requests
    pub labels: Option<Vec<String>>,

    /// Labels added once a release pull request is tagged
    pub release_labels: Option<Vec<String>>,

    /// Commit at which history scanning stops when no release exists
    pub bootstrap_sha: Option<String>,

    /// Override for the last release commit of every path
    pub last_release_sha: Option<String>,

    /// Maximum number of releases inspected
    pub release_search_depth: Option<usize>,

    /// Maximum number of commits inspected
    pub commit_search_depth: Option<usize>,
}

impl ManifestConfig {
    /// Resolve the effective config for one tracked path
    pub fn releaser_for(&self, path: &str) -> ReleaserConfig {
        match self.packages.get(path) {
            Some(overrides) => self.defaults.merged_with(overrides),
            None => self.defaults.clone(),
        }
    }

    /// Labels for open release pull requests
    pub fn labels(&self) -> Vec<String> {
        self.labels
            .clone()
            .unwrap_or_else(|| DEFAULT_LABELS.iter().map(|s| s.to_string()).collect())
    }

    /// Labels for tagged release pull requests
    pub fn release_labels(&self) -> Vec<String> {
        self.release_labels
            .clone()
            .unwrap_or_else(|| DEFAULT_RELEASE_LABELS.iter().map(|s| s.to_string()).collect())
    }

    /// Title pattern for merged pull requests
    pub fn group_pull_request_title_pattern(&self) -> &str {
        self.group_pull_request_title_pattern
            .as_deref()
            .unwrap_or(DEFAULT_GROUP_TITLE_PATTERN)
    }

    /// Maximum number of releases inspected
    pub fn release_search_depth(&self) -> usize {
        self.release_search_depth
            .unwrap_or(DEFAULT_RELEASE_SEARCH_DEPTH)
    }

    /// Maximum number of commits inspected
    pub fn commit_search_depth(&self) -> usize {
        self.commit_search_depth.unwrap_or(DEFAULT_COMMIT_SEARCH_DEPTH)
    }
}

/// Release settings for a single tracked path
///
/// Every field is optional so that package entries can override only what
/// they need; accessors supply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReleaserConfig {
    /// Ecosystem of the path
    pub release_type: Option<ReleaseType>,
    /// Explicit component name
    pub component: Option<String>,
    /// Explicit package name (defaults to the ecosystem manifest)
    pub package_name: Option<String>,
    /// Versioning strategy
    pub versioning: Option<VersioningKind>,
    /// Demote major bumps to minor below 1.0.0
    pub bump_minor_pre_major: Option<bool>,
    /// Demote minor bumps to patch below 1.0.0
    pub bump_patch_for_minor_pre_major: Option<bool>,
    /// Pre-release identifier for the prerelease strategy
    pub prerelease_type: Option<String>,
    /// Force the next version
    pub release_as: Option<String>,
    /// Changelog path relative to the tracked path
    pub changelog_path: Option<String>,
    /// Commit type to changelog section mapping
    pub changelog_sections: Option<Vec<ChangelogSection>>,
    /// Base URL used for links in release notes
    pub changelog_host: Option<String>,
    /// Do not write the changelog file
    pub skip_changelog: Option<bool>,
    /// Prefix tags with the component name
    pub include_component_in_tag: Option<bool>,
    /// Prefix the version in tags with `v`
    pub include_v_in_tag: Option<bool>,
    /// Separator between component and version in tags
    pub tag_separator: Option<String>,
    /// Pull request title pattern
    pub pull_request_title_pattern: Option<String>,
    /// Additional files carrying the version
    #[serde(deserialize_with = "deserialize_extra_files")]
    pub extra_files: Option<Vec<ExtraFile>>,
    /// Sub-paths whose commits are not attributed to this path
    pub exclude_paths: Option<Vec<String>>,
    /// Create releases as drafts
    pub draft: Option<bool>,
    /// Mark releases as pre-releases
    pub prerelease: Option<bool>,
    /// Do not create hosted releases for this path
    pub skip_github_release: Option<bool>,
    /// Merge group; candidates are only merged within the same group
    pub group: Option<String>,
}

impl ReleaserConfig {
    /// Overlay `overrides` on top of `self`
    pub fn merged_with(&self, overrides: &ReleaserConfig) -> ReleaserConfig {
        macro_rules! pick {
            ($field:ident) => {
                overrides.$field.clone().or_else(|| self.$field.clone())
            };
        }

        ReleaserConfig {
            release_type: pick!(release_type),
            // components and package names never inherit from the defaults
            component: overrides.component.clone(),
            package_name: overrides.package_name.clone(),
            versioning: pick!(versioning),
            bump_minor_pre_major: pick!(bump_minor_pre_major),
            bump_patch_for_minor_pre_major: pick!(bump_patch_for_minor_pre_major),
            prerelease_type: pick!(prerelease_type),
            release_as: pick!(release_as),
            changelog_path: pick!(changelog_path),
            changelog_sections: pick!(changelog_sections),
            changelog_host: pick!(changelog_host),
            skip_changelog: pick!(skip_changelog),
            include_component_in_tag: pick!(include_component_in_tag),
            include_v_in_tag: pick!(include_v_in_tag),
            tag_separator: pick!(tag_separator),
            pull_request_title_pattern: pick!(pull_request_title_pattern),
            extra_files: pick!(extra_files),
            exclude_paths: pick!(exclude_paths),
            draft: pick!(draft),
            prerelease: pick!(prerelease),
            skip_github_release: pick!(skip_github_release),
            group: pick!(group),
        }
    }

    /// Ecosystem of the path
    pub fn release_type(&self) -> ReleaseType {
        self.release_type.unwrap_or_default()
    }

    /// Versioning strategy
    pub fn versioning(&self) -> VersioningKind {
        self.versioning.unwrap_or_default()
    }

    /// Changelog path relative to the tracked path
    pub fn changelog_path(&self) -> &str {
        self.changelog_path
            .as_deref()
            .unwrap_or(DEFAULT_CHANGELOG_PATH)
    }

    /// Changelog sections, falling back to the conventional defaults
    pub fn changelog_sections(&self) -> Vec<ChangelogSection> {
        self.changelog_sections
            .clone()
            .unwrap_or_else(default_changelog_sections)
    }

    /// Host used in release note links
    pub fn changelog_host(&self) -> &str {
        self.changelog_host
            .as_deref()
            .unwrap_or("https://github.com")
    }

    /// Whether tags carry the component name
    pub fn include_component_in_tag(&self) -> bool {
        self.include_component_in_tag.unwrap_or(true)
    }

    /// Whether tags carry a `v` before the version
    pub fn include_v_in_tag(&self) -> bool {
        self.include_v_in_tag.unwrap_or(true)
    }

    /// Separator between component and version in tags
    pub fn tag_separator(&self) -> &str {
        self.tag_separator.as_deref().unwrap_or("-")
    }

    /// Pull request title pattern
    pub fn pull_request_title_pattern(&self) -> &str {
        self.pull_request_title_pattern
            .as_deref()
            .unwrap_or(DEFAULT_TITLE_PATTERN)
    }

    /// Extra files carrying the version
    pub fn extra_files(&self) -> &[ExtraFile] {
        self.extra_files.as_deref().unwrap_or(&[])
    }

    /// Excluded sub-paths
    pub fn exclude_paths(&self) -> &[String] {
        self.exclude_paths.as_deref().unwrap_or(&[])
    }
}

/// Mapping of a commit type to a changelog section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogSection {
    /// Commit type (feat, fix, ...)
    #[serde(rename = "type")]
    pub commit_type: String,
    /// Section heading
    pub section: String,
    /// Whether the section is omitted from rendered notes
    #[serde(default)]
    pub hidden: bool,
}

impl ChangelogSection {
    /// Create a visible section
    pub fn new(commit_type: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            commit_type: commit_type.into(),
            section: section.into(),
            hidden: false,
        }
    }

    /// Create a hidden section
    pub fn hidden(commit_type: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            hidden: true,
            ..Self::new(commit_type, section)
        }
    }
}

/// File format of an extra file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraFileKind {
    /// Marker-comment based replacement
    #[default]
    Generic,
    /// JSON value at a path
    Json,
    /// YAML value at a path
    Yaml,
    /// TOML value at a path
    Toml,
}

/// An additional version-bearing file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFile {
    /// File format
    #[serde(rename = "type", default)]
    pub kind: ExtraFileKind,
    /// Path relative to the tracked path (or the repository root when absolute)
    pub path: String,
    /// `$.a.b` style path for structured files
    #[serde(rename = "jsonpath", default)]
    pub json_path: Option<String>,
}

impl ExtraFile {
    /// A generic extra file
    pub fn generic(path: impl Into<String>) -> Self {
        Self {
            kind: ExtraFileKind::Generic,
            path: path.into(),
            json_path: None,
        }
    }
}

/// Options shared by the workspace plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WorkspacePluginOptions {
    /// Combine all workspace candidates into one pull request
    pub merge: bool,
    /// Bump transitive dependents of released packages
    pub update_dependents: bool,
    /// Bump every package in the workspace
    pub update_all_packages: bool,
}

impl Default for WorkspacePluginOptions {
    fn default() -> Self {
        Self {
            merge: true,
            update_dependents: true,
            update_all_packages: false,
        }
    }
}

/// A configured plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PluginConfig {
    /// npm workspace dependency propagation
    NodeWorkspace(WorkspacePluginOptions),
    /// Cargo workspace dependency propagation
    CargoWorkspace(WorkspacePluginOptions),
}

impl PluginConfig {
    /// Resolve a plugin given by bare name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "node-workspace" => Some(Self::NodeWorkspace(WorkspacePluginOptions::default())),
            "cargo-workspace" => Some(Self::CargoWorkspace(WorkspacePluginOptions::default())),
            _ => None,
        }
    }
}

fn deserialize_plugins<'de, D>(deserializer: D) -> Result<Vec<PluginConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPlugin {
        Name(String),
        Full(PluginConfig),
    }

    let raw: Vec<RawPlugin> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|plugin| match plugin {
            RawPlugin::Name(name) => PluginConfig::from_name(&name)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown plugin type: {}", name))),
            RawPlugin::Full(config) => Ok(config),
        })
        .collect()
}

fn deserialize_extra_files<'de, D>(deserializer: D) -> Result<Option<Vec<ExtraFile>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawExtraFile {
        Path(String),
        Full(ExtraFile),
    }

    let raw: Option<Vec<RawExtraFile>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|files| {
        files
            .into_iter()
            .map(|file| match file {
                RawExtraFile::Path(path) => ExtraFile::generic(path),
                RawExtraFile::Full(file) => file,
            })
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest_config() {
        let config: ManifestConfig = serde_json::from_str(
            r#"{
                "release-type": "node",
                "bump-minor-pre-major": true,
                "plugins": ["node-workspace", {"type": "cargo-workspace", "merge": false}],
                "packages": {
                    "packages/a": {"component": "a"},
                    "packages/b": {"release-type": "rust", "extra-files": ["VERSION", {"type": "json", "path": "meta.json", "jsonpath": "$.version"}]}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.defaults.release_type, Some(ReleaseType::Node));
        assert_eq!(config.plugins.len(), 2);
        assert_eq!(
            config.plugins[1],
            PluginConfig::CargoWorkspace(WorkspacePluginOptions {
                merge: false,
                ..Default::default()
            })
        );

        let b = config.releaser_for("packages/b");
        assert_eq!(b.release_type(), ReleaseType::Rust);
        assert_eq!(b.bump_minor_pre_major, Some(true));
        assert_eq!(b.extra_files().len(), 2);
        assert_eq!(b.extra_files()[0], ExtraFile::generic("VERSION"));
        assert_eq!(b.extra_files()[1].kind, ExtraFileKind::Json);
    }

    #[test]
    fn test_unknown_plugin_rejected() {
        let result: Result<ManifestConfig, _> =
            serde_json::from_str(r#"{"plugins": ["linked-everything"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_component_not_inherited() {
        let defaults = ReleaserConfig {
            component: Some("root".into()),
            ..Default::default()
        };
        let merged = defaults.merged_with(&ReleaserConfig::default());
        assert!(merged.component.is_none());
    }

    #[test]
    fn test_accessor_defaults() {
        let config = ReleaserConfig::default();
        assert_eq!(config.changelog_path(), "CHANGELOG.md");
        assert!(config.include_v_in_tag());
        assert_eq!(config.tag_separator(), "-");
        assert!(!config.changelog_sections().is_empty());
    }
}
