//! Java-family projects with `-SNAPSHOT` development versions
//!
//! Right after a release the path gets a snapshot pull request that moves
//! the version files to the next `-SNAPSHOT`; the following release drops
//! the marker again. Snapshots are never tagged.

use std::sync::Arc;

use liftoff_core::config::{ExtraFile, ExtraFileKind};
use liftoff_core::{Result, Version, VersionsMap};
use liftoff_git::{Commit, PullRequest};
use liftoff_strategies::JavaSnapshot;
use liftoff_updaters::{JavaMarkers, Updater};
use tracing::{debug, info};

use super::{base, extra_file_updater, BaseStrategy, Strategy};
use crate::candidate::{CandidateRelease, LatestRelease, ReleasePullRequest, Update};

const SNAPSHOT_NOTES: &str = "### Updating meta-information for bleeding-edge SNAPSHOT release.";

/// Releases a Java-family project
pub struct JavaStrategy {
    base: BaseStrategy,
}

impl JavaStrategy {
    /// Create the strategy
    pub fn new(base: BaseStrategy) -> Self {
        Self { base }
    }

    fn needs_snapshot(&self, latest: Option<&LatestRelease>) -> bool {
        self.base.configured_release_as().is_none()
            && latest.is_some_and(|latest| !JavaSnapshot::is_snapshot(&latest.tag.version))
    }
}

impl Strategy for JavaStrategy {
    fn name(&self) -> &'static str {
        "java"
    }

    fn base(&self) -> &BaseStrategy {
        &self.base
    }

    fn initial_version(&self) -> Version {
        Version::new(0, 1, 0)
    }

    fn build_updates(&self, _version: &Version, _versions_map: &VersionsMap) -> Vec<Update> {
        Vec::new()
    }

    fn extra_file_updater(&self, file: &ExtraFile, version: &Version) -> Arc<dyn Updater> {
        match file.kind {
            ExtraFileKind::Generic => Arc::new(JavaMarkers::new(version.clone())),
            _ => extra_file_updater(file, version),
        }
    }

    fn build_release_pull_request(
        &self,
        commits: &[Commit],
        latest: Option<&LatestRelease>,
    ) -> Result<Option<ReleasePullRequest>> {
        let Some(latest) = latest.filter(|_| self.needs_snapshot(latest)) else {
            return base::build_release_pull_request(self, commits, latest);
        };

        let version = self.base.versioning().bump(&latest.tag.version, &[])?;
        info!(path = %self.base.path, %version, "building snapshot pull request");

        let versions_map = self.versions_map(&version, &[])?;
        let mut pull_request =
            self.compose_pull_request(version, versions_map, SNAPSHOT_NOTES.to_string());
        let changelog = self.base.add_path(self.base.config.changelog_path());
        pull_request.updates.retain(|update| update.path != changelog);
        Ok(Some(pull_request))
    }

    fn build_release(&self, merged: &PullRequest) -> Result<Option<CandidateRelease>> {
        let release = base::build_release(self, merged)?;
        Ok(release.filter(|release| {
            let snapshot = JavaSnapshot::is_snapshot(&release.tag.version);
            if snapshot {
                debug!(tag = %release.tag, "snapshots are not released");
            }
            !snapshot
        }))
    }
}
