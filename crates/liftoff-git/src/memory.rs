//! In-memory hosting backend
//!
//! Holds a scripted repository state (files per branch, commit history,
//! releases and merged pull requests) and records every mutating call, so
//! pipelines can be exercised end to end without a network.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use liftoff_core::{HostingError, LiftoffError, Result};
use tracing::{debug, info};

use crate::history::Page;
use crate::hosting::Hosting;
use crate::types::{
    Commit, FileContents, HostedRelease, PullRequest, PullRequestRequest, ReleaseRequest,
    RepositoryInfo,
};

/// Default number of items per page
const DEFAULT_PAGE_SIZE: usize = 25;

/// First number handed out to opened pull requests
const FIRST_PULL_REQUEST_NUMBER: u64 = 1;

/// A pull request opened through [`MemoryHosting`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedPullRequest {
    /// Assigned number
    pub number: u64,
    /// Target branch
    pub target_branch: String,
    /// The request as last submitted
    pub request: PullRequestRequest,
}

#[derive(Debug, Default)]
struct Recorded {
    pull_requests: Vec<OpenedPullRequest>,
    releases: Vec<HostedRelease>,
}

/// In-memory [`Hosting`] implementation
#[derive(Debug)]
pub struct MemoryHosting {
    info: RepositoryInfo,
    files: BTreeMap<(String, String), String>,
    commits: BTreeMap<String, Vec<Commit>>,
    releases: Vec<HostedRelease>,
    merged_pull_requests: BTreeMap<String, Vec<PullRequest>>,
    page_size: usize,
    recorded: Mutex<Recorded>,
    next_number: AtomicU64,
    pages_fetched: AtomicUsize,
}

impl MemoryHosting {
    /// Create an empty repository
    pub fn new(info: RepositoryInfo) -> Self {
        Self {
            info,
            files: BTreeMap::new(),
            commits: BTreeMap::new(),
            releases: Vec::new(),
            merged_pull_requests: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            recorded: Mutex::new(Recorded::default()),
            next_number: AtomicU64::new(FIRST_PULL_REQUEST_NUMBER),
            pages_fetched: AtomicUsize::new(0),
        }
    }

    /// Add a file on a branch
    pub fn with_file(
        mut self,
        branch: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.files
            .insert((branch.into(), path.into()), content.into());
        self
    }

    /// Set the commit history of a branch, newest first
    pub fn with_commits(mut self, branch: impl Into<String>, commits: Vec<Commit>) -> Self {
        self.commits.insert(branch.into(), commits);
        self
    }

    /// Set existing releases, newest first
    pub fn with_releases(mut self, releases: Vec<HostedRelease>) -> Self {
        self.releases = releases;
        self
    }

    /// Set pull requests merged into a branch, most recent first
    pub fn with_merged_pull_requests(
        mut self,
        branch: impl Into<String>,
        pull_requests: Vec<PullRequest>,
    ) -> Self {
        self.merged_pull_requests.insert(branch.into(), pull_requests);
        self
    }

    /// Set the page size used for all listings
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Pull requests opened so far
    pub fn opened_pull_requests(&self) -> Vec<OpenedPullRequest> {
        self.recorded
            .lock()
            .map(|r| r.pull_requests.clone())
            .unwrap_or_default()
    }

    /// Releases created so far
    pub fn created_releases(&self) -> Vec<HostedRelease> {
        self.recorded
            .lock()
            .map(|r| r.releases.clone())
            .unwrap_or_default()
    }

    /// Total number of pages served across all listings
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched.load(Ordering::SeqCst)
    }

    fn page_of<T: Clone>(&self, items: &[T], cursor: Option<String>) -> Result<Page<T>> {
        let offset = match cursor {
            Some(cursor) => cursor.parse::<usize>().map_err(|_| {
                HostingError::InvalidResponse(format!("invalid page cursor '{}'", cursor))
            })?,
            None => 0,
        };
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);

        let end = (offset + self.page_size).min(items.len());
        let page = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
        let next = (end < items.len()).then(|| end.to_string());
        Ok(Page::new(page, next))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Recorded>> {
        self.recorded
            .lock()
            .map_err(|_| LiftoffError::other("memory hosting state poisoned"))
    }
}

#[async_trait]
impl Hosting for MemoryHosting {
    fn repository(&self) -> &RepositoryInfo {
        &self.info
    }

    async fn file_contents_on_branch(&self, path: &str, branch: &str) -> Result<FileContents> {
        debug!(path, branch, "fetching file");
        self.files
            .get(&(branch.to_string(), path.to_string()))
            .map(FileContents::from_content)
            .ok_or_else(|| {
                HostingError::FileNotFound {
                    path: path.to_string(),
                    branch: branch.to_string(),
                }
                .into()
            })
    }

    async fn commits_page(&self, branch: &str, cursor: Option<String>) -> Result<Page<Commit>> {
        let commits = self.commits.get(branch).map(Vec::as_slice).unwrap_or(&[]);
        self.page_of(commits, cursor)
    }

    async fn releases_page(&self, cursor: Option<String>) -> Result<Page<HostedRelease>> {
        let mut releases = self.created_releases();
        releases.reverse();
        releases.extend(self.releases.iter().cloned());
        self.page_of(&releases, cursor)
    }

    async fn merged_pull_requests_page(
        &self,
        branch: &str,
        cursor: Option<String>,
    ) -> Result<Page<PullRequest>> {
        let pull_requests = self
            .merged_pull_requests
            .get(branch)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.page_of(pull_requests, cursor)
    }

    async fn open_pull_request(
        &self,
        request: &PullRequestRequest,
        target_branch: &str,
    ) -> Result<u64> {
        let mut recorded = self.lock()?;

        if let Some(existing) = recorded
            .pull_requests
            .iter_mut()
            .find(|pr| pr.request.head_branch == request.head_branch)
        {
            info!(
                number = existing.number,
                branch = %request.head_branch,
                "updating release pull request"
            );
            existing.request = request.clone();
            existing.target_branch = target_branch.to_string();
            return Ok(existing.number);
        }

        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        info!(number, branch = %request.head_branch, title = %request.title, "opened release pull request");
        recorded.pull_requests.push(OpenedPullRequest {
            number,
            target_branch: target_branch.to_string(),
            request: request.clone(),
        });
        Ok(number)
    }

    async fn create_release(&self, request: &ReleaseRequest) -> Result<HostedRelease> {
        let mut recorded = self.lock()?;

        let exists = self
            .releases
            .iter()
            .chain(recorded.releases.iter())
            .any(|r| r.tag_name == request.tag_name);
        if exists {
            return Err(HostingError::AlreadyExists(request.tag_name.clone()).into());
        }

        let release = HostedRelease {
            name: Some(request.name.clone()),
            tag_name: request.tag_name.clone(),
            sha: request.sha.clone(),
            notes: Some(request.notes.clone()),
            url: Some(format!(
                "https://github.com/{}/{}/releases/tag/{}",
                self.info.owner, self.info.repo, request.tag_name
            )),
        };
        info!(tag = %release.tag_name, sha = %release.sha, "created release");
        recorded.releases.push(release.clone());
        Ok(release)
    }
}
