//! Per-path release strategies
//!
//! A strategy turns the commits of one tracked path into a release pull
//! request, and a merged release pull request back into a release. The
//! shared flow lives in [`BaseStrategy`]; ecosystems only contribute their
//! initial version and the files that carry the version.

mod base;
mod java;
mod node;
mod python;
mod rust;
mod simple;

use std::sync::Arc;

use liftoff_changelog::{build_notes, ClassifiedCommit, NotesContext};
use liftoff_core::config::{ExtraFile, ExtraFileKind};
use liftoff_core::{ReleaseType, Result, Version, VersionsMap, ROOT_PROJECT_PATH};
use liftoff_git::{Commit, Hosting, PullRequest, TagName};
use liftoff_strategies::release_as_override;
use liftoff_updaters::{Generic, JsonPathUpdater, TomlPathUpdater, Updater, YamlPathUpdater};
use tracing::{debug, warn};

use crate::candidate::{CandidateRelease, LatestRelease, ReleasePullRequest, Update};

pub use base::{Artifact, BaseStrategy, StrategyOptions};
pub use java::JavaStrategy;
pub use node::NodeStrategy;
pub use python::PythonStrategy;
pub use rust::RustStrategy;
pub use simple::SimpleStrategy;

/// Release strategy of one tracked path
pub trait Strategy: Send + Sync {
    /// Get the ecosystem name
    fn name(&self) -> &'static str;

    /// Shared state and configuration
    fn base(&self) -> &BaseStrategy;

    /// Version of the first release
    fn initial_version(&self) -> Version {
        Version::new(1, 0, 0)
    }

    /// Updates of the ecosystem's own version files
    fn build_updates(&self, version: &Version, versions_map: &VersionsMap) -> Vec<Update>;

    /// Updater for a configured extra file
    fn extra_file_updater(&self, file: &ExtraFile, version: &Version) -> Arc<dyn Updater> {
        extra_file_updater(file, version)
    }

    /// Tracked path
    fn path(&self) -> &str {
        &self.base().path
    }

    /// Resolved component name
    fn component(&self) -> Option<&str> {
        self.base().component.as_deref()
    }

    /// Next version given the commits since `latest`
    fn next_version(
        &self,
        commits: &[ClassifiedCommit],
        latest: Option<&LatestRelease>,
    ) -> Result<Version> {
        let base = self.base();
        if let Some(version) = base.configured_release_as() {
            debug!(path = %base.path, %version, "using configured release-as");
            return Ok(version);
        }
        match latest {
            Some(latest) => base.versioning().bump(&latest.tag.version, commits),
            None => Ok(release_as_override(commits).unwrap_or_else(|| self.initial_version())),
        }
    }

    /// Render release notes for `version`
    fn render_notes(
        &self,
        commits: &[ClassifiedCommit],
        version: &Version,
        previous_tag: Option<&TagName>,
    ) -> String {
        let base = self.base();
        let context = NotesContext {
            host: base.config.changelog_host().to_string(),
            owner: base.repository.owner.clone(),
            repository: base.repository.repo.clone(),
            version: version.to_string(),
            previous_tag: previous_tag.map(ToString::to_string),
            current_tag: base.tag_for(version.clone()).to_string(),
            target_branch: base.target_branch.clone(),
            date: base.date,
            changelog_sections: base.config.changelog_sections(),
        };
        build_notes(commits, &context)
    }

    /// Versions of the artifacts released from this path
    fn versions_map(&self, version: &Version, commits: &[ClassifiedCommit]) -> Result<VersionsMap> {
        self.base().versions_map(version, commits)
    }

    /// Assemble a release pull request for `version` with `notes`
    fn compose_pull_request(
        &self,
        version: Version,
        versions_map: VersionsMap,
        notes: String,
    ) -> ReleasePullRequest {
        base::compose_pull_request(self, version, versions_map, notes)
    }

    /// Build the release pull request for the commits since `latest`.
    ///
    /// Returns `None` when no commit would show up in the release notes.
    fn build_release_pull_request(
        &self,
        commits: &[Commit],
        latest: Option<&LatestRelease>,
    ) -> Result<Option<ReleasePullRequest>> {
        base::build_release_pull_request(self, commits, latest)
    }

    /// Reconstruct this path's release from a merged release pull request
    fn build_release(&self, merged: &PullRequest) -> Result<Option<CandidateRelease>> {
        base::build_release(self, merged)
    }
}

/// Updater of an extra file by its declared format
pub(crate) fn extra_file_updater(file: &ExtraFile, version: &Version) -> Arc<dyn Updater> {
    let json_path = || file.json_path.clone().unwrap_or_else(|| "$.version".to_string());
    match file.kind {
        ExtraFileKind::Generic => Arc::new(Generic::new(version.clone())),
        ExtraFileKind::Json => Arc::new(JsonPathUpdater::new(json_path(), version.clone())),
        ExtraFileKind::Yaml => Arc::new(YamlPathUpdater::new(json_path(), version.clone())),
        ExtraFileKind::Toml => Arc::new(TomlPathUpdater::new(json_path(), version.clone())),
    }
}

/// Manifest file that names the package of an ecosystem
fn manifest_file(release_type: ReleaseType) -> Option<&'static str> {
    match release_type {
        ReleaseType::Node => Some(node::MANIFEST_FILE),
        ReleaseType::Rust => Some(rust::MANIFEST_FILE),
        ReleaseType::Python => Some(python::MANIFEST_FILE),
        ReleaseType::Simple | ReleaseType::Java => None,
    }
}

fn package_name(release_type: ReleaseType, content: &str) -> Option<String> {
    match release_type {
        ReleaseType::Node => node::package_name(content),
        ReleaseType::Rust => rust::package_name(content),
        ReleaseType::Python => python::package_name(content),
        ReleaseType::Simple | ReleaseType::Java => None,
    }
}

/// Join a file onto a tracked path
pub(crate) fn add_path(path: &str, file: &str) -> String {
    let file = file.trim_start_matches("./");
    if path == ROOT_PROJECT_PATH || path.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", path.trim_end_matches('/'), file)
    }
}

/// Build the strategy of one tracked path.
///
/// The package name is read from the ecosystem manifest on the target
/// branch unless configured; the component falls back to the package
/// name, then the repository name for the root path, then the last path
/// segment.
pub async fn build_strategy(
    hosting: &dyn Hosting,
    options: StrategyOptions,
) -> Result<Arc<dyn Strategy>> {
    let release_type = options.config.release_type();

    // a Cargo workspace root is read even when the package is named in config
    let wants_manifest =
        options.config.package_name.is_none() || release_type == ReleaseType::Rust;
    let manifest = match manifest_file(release_type).filter(|_| wants_manifest) {
        Some(file) => {
            let manifest_path = add_path(&options.path, file);
            match hosting
                .file_contents_on_branch(&manifest_path, &options.target_branch)
                .await
            {
                Ok(contents) => Some(contents.content),
                Err(e) if e.is_file_not_found() => {
                    debug!(path = %manifest_path, "no ecosystem manifest");
                    None
                }
                Err(e) => return Err(e),
            }
        }
        None => None,
    };

    let mut artifacts = match (release_type, manifest.as_deref()) {
        (ReleaseType::Rust, Some(content)) => {
            rust::workspace_artifacts(hosting, &options.path, &options.target_branch, content)
                .await?
        }
        _ => Vec::new(),
    };
    // tracked members release from their own path
    artifacts.retain(|artifact| !options.tracked_paths.contains(&artifact.path));

    let package_name_found = options.config.package_name.clone().or_else(|| {
        let content = manifest.as_deref()?;
        let name = package_name(release_type, content);
        if name.is_none() && artifacts.is_empty() {
            warn!(path = %options.path, "manifest does not name a package");
        }
        name
    });

    let component = options
        .config
        .component
        .clone()
        .or_else(|| match release_type {
            ReleaseType::Node => package_name_found.as_deref().map(node::component_name),
            _ => package_name_found.clone(),
        })
        .or_else(|| {
            if options.path == ROOT_PROJECT_PATH {
                Some(hosting.repository().repo.clone())
            } else {
                options.path.rsplit('/').next().map(str::to_string)
            }
        })
        .filter(|c| !c.is_empty());

    debug!(
        path = %options.path,
        release_type = release_type.as_str(),
        component = component.as_deref().unwrap_or_default(),
        "built strategy"
    );

    let base = BaseStrategy::new(options, component, package_name_found).with_artifacts(artifacts);
    let strategy: Arc<dyn Strategy> = match release_type {
        ReleaseType::Simple => Arc::new(SimpleStrategy::new(base)),
        ReleaseType::Node => Arc::new(NodeStrategy::new(base)),
        ReleaseType::Rust => Arc::new(RustStrategy::new(base)),
        ReleaseType::Java => Arc::new(JavaStrategy::new(base)),
        ReleaseType::Python => Arc::new(PythonStrategy::new(base)),
    };
    Ok(strategy)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use liftoff_core::config::ReleaserConfig;
    use liftoff_git::{MemoryHosting, RepositoryInfo};

    use super::*;

    pub fn options(path: &str, config: ReleaserConfig) -> StrategyOptions {
        StrategyOptions {
            path: path.to_string(),
            tracked_paths: vec![path.to_string()],
            config,
            target_branch: "main".to_string(),
            repository: RepositoryInfo::new("owner", "repo", "main"),
            labels: vec!["autorelease: pending".to_string()],
            release_labels: vec!["autorelease: tagged".to_string()],
            group_title_pattern: "chore: release ${branch}".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    pub fn hosting() -> MemoryHosting {
        MemoryHosting::new(RepositoryInfo::new("owner", "repo", "main"))
    }

    pub fn commits(messages: &[&str]) -> Vec<Commit> {
        messages
            .iter()
            .enumerate()
            .map(|(i, message)| Commit::new(format!("{:07}abcdef", i + 1), *message))
            .collect()
    }

    pub fn latest(tag: &str) -> LatestRelease {
        LatestRelease {
            tag: TagName::parse(tag).unwrap(),
            sha: "0000000000".to_string(),
            notes: None,
        }
    }

    pub fn update_paths(pull_request: &ReleasePullRequest) -> Vec<&str> {
        pull_request.updates.iter().map(|u| u.path.as_str()).collect()
    }
}
