//! `{x-version-update:artifact:current}` markers used by Java builds

use std::sync::LazyLock;

use liftoff_core::{Result, UpdaterError, Version, VersionsMap};
use regex::{NoExpand, Regex};

use crate::traits::Updater;

static INLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{x-version-update:(?P<artifact>[\w.-]+):(?P<kind>current|released)\}")
        .expect("Invalid regex")
});

static BLOCK_START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{x-version-update-start:(?P<artifact>[\w.-]+):(?P<kind>current|released)\}")
        .expect("Invalid regex")
});

static BLOCK_END_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{x-version-update-end\}").expect("Invalid regex"));

static JAVA_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\d+\.\d+(?:-[\w.-]+)?").expect("Invalid regex")
});

/// Replaces versions next to `x-version-update` markers.
///
/// Artifacts are looked up in the versions map; when the map is empty every
/// marker gets the release version. `released` markers skip snapshot
/// versions since they track the last published release.
#[derive(Debug, Clone)]
pub struct JavaMarkers {
    version: Version,
    versions_map: VersionsMap,
}

impl JavaMarkers {
    /// Create an updater writing `version`
    pub fn new(version: Version) -> Self {
        Self {
            version,
            versions_map: VersionsMap::new(),
        }
    }

    /// Use per-artifact versions
    pub fn with_versions_map(mut self, versions_map: VersionsMap) -> Self {
        self.versions_map = versions_map;
        self
    }

    fn version_for(&self, artifact: &str, kind: &str) -> Option<&Version> {
        let version = if self.versions_map.is_empty() {
            Some(&self.version)
        } else {
            self.versions_map.get(artifact)
        }?;
        let is_snapshot = version
            .pre_release
            .as_deref()
            .is_some_and(|pre| pre.ends_with("SNAPSHOT"));
        (kind == "current" || !is_snapshot).then_some(version)
    }
}

impl Updater for JavaMarkers {
    fn name(&self) -> &'static str {
        "java-markers"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent("java file".to_string()))?;

        let mut block: Option<(String, String)> = None;
        let lines: Vec<String> = content
            .split('\n')
            .map(|line| {
                if let Some(caps) = BLOCK_START_REGEX.captures(line) {
                    block = Some((caps["artifact"].to_string(), caps["kind"].to_string()));
                    return line.to_string();
                }
                if BLOCK_END_REGEX.is_match(line) {
                    block = None;
                    return line.to_string();
                }
                let marker = INLINE_REGEX
                    .captures(line)
                    .map(|caps| (caps["artifact"].to_string(), caps["kind"].to_string()))
                    .or_else(|| block.clone());
                match marker.and_then(|(artifact, kind)| self.version_for(&artifact, &kind)) {
                    Some(version) => JAVA_VERSION_REGEX
                        .replacen(line, 1, NoExpand(&version.to_string()))
                        .into_owned(),
                    None => line.to_string(),
                }
            })
            .collect();

        Ok(lines.join("\n"))
    }
}
