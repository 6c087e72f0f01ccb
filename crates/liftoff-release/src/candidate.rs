//! Release candidates passed between pipeline stages

use std::fmt;
use std::sync::Arc;

use liftoff_core::config::ReleaserConfig;
use liftoff_core::{Version, VersionsMap};
use liftoff_git::{BranchName, FileContents, PullRequestRequest, FileChange, TagName};
use liftoff_updaters::Updater;

use crate::body::PullRequestBody;
use crate::title::PullRequestTitle;

/// A pending change to one file
#[derive(Clone)]
pub struct Update {
    /// Repository-relative path
    pub path: String,
    /// Create the file when it does not exist yet
    pub create_if_missing: bool,
    /// Content fetched earlier in the pipeline
    pub cached_file_contents: Option<FileContents>,
    /// Produces the new content
    pub updater: Arc<dyn Updater>,
}

impl Update {
    /// Update an existing file
    pub fn new(path: impl Into<String>, updater: Arc<dyn Updater>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: false,
            cached_file_contents: None,
            updater,
        }
    }

    /// Update a file, creating it when missing
    pub fn create_if_missing(path: impl Into<String>, updater: Arc<dyn Updater>) -> Self {
        Self {
            create_if_missing: true,
            ..Self::new(path, updater)
        }
    }

    /// The same update with another updater
    pub fn with_updater(&self, updater: Arc<dyn Updater>) -> Self {
        Self {
            updater,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("path", &self.path)
            .field("create_if_missing", &self.create_if_missing)
            .field("cached", &self.cached_file_contents.is_some())
            .field("updater", &self.updater.name())
            .finish()
    }
}

/// A release pull request before it is opened
#[derive(Debug, Clone)]
pub struct ReleasePullRequest {
    /// Title
    pub title: PullRequestTitle,
    /// Body with one entry per component
    pub body: PullRequestBody,
    /// File updates, applied in order
    pub updates: Vec<Update>,
    /// Labels
    pub labels: Vec<String>,
    /// Head branch
    pub head_ref_name: BranchName,
    /// Version being released, `None` for merged pull requests
    pub version: Option<Version>,
    /// Open as a draft
    pub draft: bool,
    /// Merge group
    pub group: Option<String>,
}

impl ReleasePullRequest {
    /// The request sent to the hosting backend
    pub fn to_request(&self, changes: Vec<FileChange>) -> PullRequestRequest {
        PullRequestRequest {
            title: self.title.to_string(),
            body: self.body.to_string(),
            head_branch: self.head_ref_name.to_string(),
            labels: self.labels.clone(),
            draft: self.draft,
            changes,
        }
    }
}

/// A release pull request together with the path that produced it
#[derive(Debug, Clone)]
pub struct CandidateReleasePullRequest {
    /// Tracked path (root for merged candidates)
    pub path: String,
    /// The pull request
    pub pull_request: ReleasePullRequest,
    /// Effective config of the path
    pub config: ReleaserConfig,
    /// New version of every tracked path covered by this candidate
    pub released_versions: VersionsMap,
}

impl CandidateReleasePullRequest {
    /// Wrap a single-path pull request
    pub fn new(path: impl Into<String>, pull_request: ReleasePullRequest, config: ReleaserConfig) -> Self {
        let path = path.into();
        let mut released_versions = VersionsMap::new();
        if let Some(version) = &pull_request.version {
            released_versions.insert(path.clone(), version.clone());
        }
        Self {
            path,
            pull_request,
            config,
            released_versions,
        }
    }
}

/// The most recent release of a tracked path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestRelease {
    /// Tag of the release
    pub tag: TagName,
    /// Commit the tag points at
    pub sha: String,
    /// Release notes, when known
    pub notes: Option<String>,
}

/// A release reconstructed from a merged release pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRelease {
    /// Tag to create
    pub tag: TagName,
    /// Commit to tag
    pub sha: String,
    /// Release notes
    pub notes: String,
    /// Tracked path
    pub path: String,
    /// Component, when tags carry one
    pub component: Option<String>,
    /// Release name
    pub name: String,
    /// Create as a draft
    pub draft: bool,
    /// Mark as a pre-release
    pub prerelease: bool,
    /// Number of the merged pull request
    pub pull_request_number: u64,
}
