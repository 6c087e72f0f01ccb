//! Shared strategy state and flow

use std::sync::Arc;

use chrono::NaiveDate;
use liftoff_changelog::{classify, has_user_facing_changes, ClassifiedCommit};
use liftoff_core::config::ReleaserConfig;
use liftoff_core::{ReleaseError, Result, Version, VersionsMap};
use liftoff_git::{BranchName, Commit, PullRequest, RepositoryInfo, TagName};
use liftoff_strategies::{release_as_override, strategy_for, VersioningStrategy};
use liftoff_updaters::ChangelogUpdater;
use tracing::{debug, info, instrument, warn};

use super::{add_path, Strategy};
use crate::body::{PullRequestBody, ReleaseData};
use crate::candidate::{CandidateRelease, LatestRelease, ReleasePullRequest, Update};
use crate::title::PullRequestTitle;

/// Inputs shared by every strategy
#[derive(Debug, Clone)]
pub struct StrategyOptions {
    /// Tracked path
    pub path: String,
    /// Every tracked path of the manifest
    pub tracked_paths: Vec<String>,
    /// Effective config of the path
    pub config: ReleaserConfig,
    /// Branch releases are cut from
    pub target_branch: String,
    /// Repository identity
    pub repository: RepositoryInfo,
    /// Labels of open release pull requests
    pub labels: Vec<String>,
    /// Labels of tagged release pull requests
    pub release_labels: Vec<String>,
    /// Title pattern of merged release pull requests
    pub group_title_pattern: String,
    /// Release date used in notes
    pub date: NaiveDate,
}

/// A separately versioned artifact released from one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Artifact name
    pub name: String,
    /// Repository-relative directory of the artifact
    pub path: String,
    /// Version on the target branch
    pub version: Version,
}

/// State shared by every ecosystem strategy
pub struct BaseStrategy {
    /// Tracked path
    pub path: String,
    /// Effective config of the path
    pub config: ReleaserConfig,
    /// Branch releases are cut from
    pub target_branch: String,
    /// Repository identity
    pub repository: RepositoryInfo,
    /// Resolved component name
    pub component: Option<String>,
    /// Package name from the ecosystem manifest or config
    pub package_name: Option<String>,
    /// Labels of open release pull requests
    pub labels: Vec<String>,
    /// Labels of tagged release pull requests
    pub release_labels: Vec<String>,
    /// Title pattern of merged release pull requests
    pub group_title_pattern: String,
    /// Release date used in notes
    pub date: NaiveDate,
    /// Artifacts bumped independently of the path version
    pub artifacts: Vec<Artifact>,
    versioning: Arc<dyn VersioningStrategy>,
}

impl BaseStrategy {
    /// Create the shared state
    pub fn new(
        options: StrategyOptions,
        component: Option<String>,
        package_name: Option<String>,
    ) -> Self {
        let versioning = strategy_for(&options.config);
        Self {
            path: options.path,
            config: options.config,
            target_branch: options.target_branch,
            repository: options.repository,
            component,
            package_name,
            labels: options.labels,
            release_labels: options.release_labels,
            group_title_pattern: options.group_title_pattern,
            date: options.date,
            artifacts: Vec::new(),
            versioning,
        }
    }

    /// Release these artifacts alongside the path
    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Versioning strategy of the path
    pub fn versioning(&self) -> &dyn VersioningStrategy {
        self.versioning.as_ref()
    }

    /// Component used in tags, titles and bodies
    pub fn tag_component(&self) -> Option<&str> {
        if self.config.include_component_in_tag() {
            self.component.as_deref()
        } else {
            None
        }
    }

    /// Tag of a release of this path
    pub fn tag_for(&self, version: Version) -> TagName {
        TagName::new(
            version,
            self.tag_component(),
            self.config.tag_separator(),
            self.config.include_v_in_tag(),
        )
    }

    /// Head branch of this path's release pull request
    pub fn branch_name(&self) -> BranchName {
        match &self.component {
            Some(component) => {
                BranchName::of_component_target_branch(component.clone(), self.target_branch.clone())
            }
            None => BranchName::of_target_branch(self.target_branch.clone()),
        }
    }

    /// Repository-relative path of a file in this path
    pub fn add_path(&self, file: &str) -> String {
        add_path(&self.path, file)
    }

    /// Path of an extra file; a leading `/` means repository-relative
    pub fn extra_file_path(&self, file: &str) -> String {
        match file.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => self.add_path(file),
        }
    }

    /// Versions of the artifacts released from this path.
    ///
    /// A path without artifacts releases one package at `version`. Every
    /// artifact is bumped from its own version with the same commits,
    /// unless `release-as` pins them all.
    pub fn versions_map(
        &self,
        version: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<VersionsMap> {
        let mut map = VersionsMap::new();
        if self.artifacts.is_empty() {
            if let Some(name) = self.package_name.as_ref().or(self.component.as_ref()) {
                map.insert(name.clone(), version.clone());
            }
            return Ok(map);
        }

        let pinned = self.configured_release_as();
        for artifact in &self.artifacts {
            let next = match &pinned {
                Some(pinned) => pinned.clone(),
                None => self.versioning().bump(&artifact.version, commits)?,
            };
            debug!(artifact = %artifact.name, from = %artifact.version, to = %next, "bumped artifact");
            map.insert(artifact.name.clone(), next);
        }
        Ok(map)
    }

    /// The configured `release-as` version, ignoring invalid values
    pub fn configured_release_as(&self) -> Option<Version> {
        let raw = self.config.release_as.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match Version::parse(raw) {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(path = %self.path, error = %e, "ignoring invalid release-as");
                None
            }
        }
    }

    fn changelog_update(&self, version: &Version, notes: &str) -> Option<Update> {
        if self.config.skip_changelog.unwrap_or(false) {
            return None;
        }
        Some(Update::create_if_missing(
            self.add_path(self.config.changelog_path()),
            Arc::new(ChangelogUpdater::new(version.clone(), notes)),
        ))
    }
}

pub(crate) fn compose_pull_request<S: Strategy + ?Sized>(
    strategy: &S,
    version: Version,
    versions_map: VersionsMap,
    notes: String,
) -> ReleasePullRequest {
    let base = strategy.base();

    let mut updates: Vec<Update> = base.changelog_update(&version, &notes).into_iter().collect();
    updates.extend(strategy.build_updates(&version, &versions_map));
    updates.extend(base.config.extra_files().iter().map(|file| {
        Update::new(
            base.extra_file_path(&file.path),
            strategy.extra_file_updater(file, &version),
        )
    }));

    let component = base.tag_component();
    let title = PullRequestTitle::of_component_target_branch_version(
        component,
        &base.target_branch,
        version.clone(),
        Some(base.config.pull_request_title_pattern()),
    );
    let body = PullRequestBody::new(
        vec![ReleaseData {
            component: component.map(str::to_string),
            version: Some(version.clone()),
            notes,
        }],
        component.is_some(),
    );

    ReleasePullRequest {
        title,
        body,
        updates,
        labels: base.labels.clone(),
        head_ref_name: base.branch_name(),
        version: Some(version),
        draft: base.config.draft.unwrap_or(false),
        group: base.config.group.clone(),
    }
}

#[instrument(skip_all, fields(path = %strategy.base().path, commit_count = commits.len()))]
pub(crate) fn build_release_pull_request<S: Strategy + ?Sized>(
    strategy: &S,
    commits: &[Commit],
    latest: Option<&LatestRelease>,
) -> Result<Option<ReleasePullRequest>> {
    let base = strategy.base();
    let classified = classify(commits);

    let forced = base.configured_release_as().is_some() || release_as_override(&classified).is_some();
    if !forced && !has_user_facing_changes(&classified, &base.config.changelog_sections()) {
        info!(path = %base.path, "no user facing commits found");
        return Ok(None);
    }

    let version = strategy.next_version(&classified, latest)?;
    let versions_map = strategy.versions_map(&version, &classified)?;
    let notes = strategy.render_notes(&classified, &version, latest.map(|l| &l.tag));
    info!(
        path = %base.path,
        previous = latest.map(|l| l.tag.version.to_string()).unwrap_or_default(),
        %version,
        "built release pull request"
    );
    Ok(Some(strategy.compose_pull_request(version, versions_map, notes)))
}

#[instrument(skip_all, fields(path = %strategy.base().path, number = merged.number))]
pub(crate) fn build_release<S: Strategy + ?Sized>(
    strategy: &S,
    merged: &PullRequest,
) -> Result<Option<CandidateRelease>> {
    let base = strategy.base();
    let malformed = |reason: &str| ReleaseError::MalformedPullRequest {
        number: merged.number,
        reason: reason.to_string(),
    };

    if merged.labels.iter().any(|l| base.release_labels.contains(l)) {
        debug!("pull request already tagged");
        return Ok(None);
    }
    let Some(sha) = merged.merge_commit_sha.clone() else {
        debug!("pull request has no merge commit");
        return Ok(None);
    };
    let Some(branch) = BranchName::parse(&merged.head_branch) else {
        debug!(branch = %merged.head_branch, "not a release branch");
        return Ok(None);
    };
    if branch.component.is_some() && branch.component != base.component {
        debug!("release branch belongs to another component");
        return Ok(None);
    }
    if branch.group.is_some() && branch.group != base.config.group {
        debug!("release branch belongs to another merge group");
        return Ok(None);
    }

    let pattern = if branch.component.is_some() {
        base.config.pull_request_title_pattern()
    } else {
        base.group_title_pattern.as_str()
    };
    let title = PullRequestTitle::parse(&merged.title, pattern)
        .ok_or_else(|| malformed("title does not match the release title pattern"))?;
    let body = PullRequestBody::parse(&merged.body)
        .ok_or_else(|| malformed("body does not contain release notes"))?;

    let wanted = base.tag_component();
    let entry = body
        .releases
        .iter()
        .find(|release| release.component.as_deref() == wanted)
        .or_else(|| {
            let single = body.releases.len() == 1 && branch.component.is_some();
            single.then(|| &body.releases[0])
        });
    let Some(entry) = entry else {
        debug!(component = wanted.unwrap_or_default(), "no release entry for component");
        return Ok(None);
    };

    let version = entry
        .version
        .clone()
        .or_else(|| title.version.clone())
        .ok_or_else(|| malformed("release entry has no version"))?;
    if branch.component.is_some() {
        if let Some(title_version) = &title.version {
            if *title_version != version {
                return Err(malformed("title and body versions differ").into());
            }
        }
    }

    let tag = base.tag_for(version.clone());
    let name = match wanted {
        Some(component) => format!("{}: {}", component, tag),
        None => tag.to_string(),
    };
    debug!(tag = %tag, sha = %sha, "reconstructed release");

    Ok(Some(CandidateRelease {
        prerelease: base.config.prerelease.unwrap_or(false) || version.pre_release.is_some(),
        tag,
        sha,
        notes: entry.notes.clone(),
        path: base.path.clone(),
        component: wanted.map(str::to_string),
        name,
        draft: base.config.draft.unwrap_or(false),
        pull_request_number: merged.number,
    }))
}
