//! Hosting collaborator trait

use async_trait::async_trait;
use liftoff_core::Result;

use crate::history::{History, Page};
use crate::types::{
    Commit, FileContents, HostedRelease, PullRequest, PullRequestRequest, ReleaseRequest,
    RepositoryInfo,
};

/// Everything the release pipeline needs from a hosting platform.
///
/// Backends implement the page-level methods; the lazy [`History`]
/// sequences on top of them are provided. Cursors are opaque strings handed
/// back by the previous page, `None` requests the first page.
#[async_trait]
pub trait Hosting: Send + Sync {
    /// Identity of the repository (owner, name, default branch)
    fn repository(&self) -> &RepositoryInfo;

    /// Fetch a file from the tip of `branch`.
    ///
    /// A missing file fails with `HostingError::FileNotFound` so callers can
    /// tell it apart from transport errors.
    async fn file_contents_on_branch(&self, path: &str, branch: &str) -> Result<FileContents>;

    /// One page of commits reachable from `branch`, newest first
    async fn commits_page(&self, branch: &str, cursor: Option<String>) -> Result<Page<Commit>>;

    /// One page of releases, newest first
    async fn releases_page(&self, cursor: Option<String>) -> Result<Page<HostedRelease>>;

    /// One page of pull requests merged into `branch`, most recently merged first
    async fn merged_pull_requests_page(
        &self,
        branch: &str,
        cursor: Option<String>,
    ) -> Result<Page<PullRequest>>;

    /// Open (or refresh) a release pull request against `target_branch`
    async fn open_pull_request(
        &self,
        request: &PullRequestRequest,
        target_branch: &str,
    ) -> Result<u64>;

    /// Create a tag and release.
    ///
    /// Fails with `HostingError::AlreadyExists` when the tag already exists.
    async fn create_release(&self, request: &ReleaseRequest) -> Result<HostedRelease>;

    /// Lazily walk commits on `branch`, yielding at most `max` of them
    fn merge_commits(&self, branch: &str, max: usize) -> History<'_, Commit> {
        History::merge_commits(self, branch, max)
    }

    /// Lazily walk releases, yielding at most `max` of them
    fn releases(&self, max: usize) -> History<'_, HostedRelease> {
        History::releases(self, max)
    }

    /// Lazily walk pull requests merged into `branch`, yielding at most `max`
    fn merged_pull_requests(&self, branch: &str, max: usize) -> History<'_, PullRequest> {
        History::merged_pull_requests(self, branch, max)
    }
}
