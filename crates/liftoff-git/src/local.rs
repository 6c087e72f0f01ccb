//! Read-only hosting backend over a local git repository

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use git2::{ErrorCode, ObjectType, Repository, Sort};
use liftoff_core::{HostingError, Result};
use tracing::{debug, info, instrument};
use url::Url;

use crate::commits::to_commit;
use crate::history::Page;
use crate::hosting::Hosting;
use crate::types::{
    Commit, FileContents, HostedRelease, PullRequest, PullRequestRequest, ReleaseRequest,
    RepositoryInfo,
};

/// Items per page for commit and release listings
const PAGE_SIZE: usize = 100;

/// A local repository exposed through the [`Hosting`] interface.
///
/// Commits, files and tags are read straight from the object database.
/// Merged pull requests are not tracked locally, and every mutating call
/// fails with `HostingError::Unsupported`, so this backend only serves
/// dry runs.
pub struct LocalRepository {
    repo: Mutex<Repository>,
    path: PathBuf,
    info: RepositoryInfo,
}

impl LocalRepository {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                HostingError::RepositoryNotFound(path.to_path_buf())
            } else {
                HostingError::Git2(e)
            }
        })?;
        Ok(Self::from_repository(repo, path.to_path_buf()))
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        info!(start_path = %start_path.display(), "discovering git repository");
        let repo = Repository::discover(start_path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                HostingError::RepositoryNotFound(start_path.to_path_buf())
            } else {
                HostingError::Git2(e)
            }
        })?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        Ok(Self::from_repository(repo, path))
    }

    fn from_repository(repo: Repository, path: PathBuf) -> Self {
        let info = repository_info(&repo, &path);
        debug!(owner = %info.owner, repo = %info.repo, branch = %info.default_branch, "resolved repository");
        Self {
            repo: Mutex::new(repo),
            path,
            info,
        }
    }

    /// Repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Repository>, HostingError> {
        self.repo
            .lock()
            .map_err(|_| HostingError::InvalidResponse("repository lock poisoned".to_string()))
    }

    fn read_file(&self, path: &str, branch: &str) -> std::result::Result<FileContents, HostingError> {
        let repo = self.lock()?;
        let not_found = || HostingError::FileNotFound {
            path: path.to_string(),
            branch: branch.to_string(),
        };

        let tree = resolve_branch(&repo, branch)?.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let object = entry.to_object(&repo)?;
        let blob = object.as_blob().ok_or_else(not_found)?;

        Ok(FileContents {
            content: String::from_utf8_lossy(blob.content()).into_owned(),
            sha: blob.id().to_string(),
        })
    }

    fn read_commits(
        &self,
        branch: &str,
        offset: usize,
    ) -> std::result::Result<Page<Commit>, HostingError> {
        let repo = self.lock()?;
        let tip = resolve_branch(&repo, branch)?;

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(tip.id())?;

        let mut commits = Vec::new();
        let mut more = false;
        for oid in revwalk.skip(offset) {
            if commits.len() == PAGE_SIZE {
                more = true;
                break;
            }
            let commit = repo.find_commit(oid?)?;
            commits.push(to_commit(&repo, &commit)?);
        }

        let next = more.then(|| (offset + commits.len()).to_string());
        Ok(Page::new(commits, next))
    }

    fn read_releases(&self, offset: usize) -> std::result::Result<Page<HostedRelease>, HostingError> {
        let repo = self.lock()?;

        let mut tagged: Vec<(i64, HostedRelease)> = Vec::new();
        for name in repo.tag_names(None)?.iter().flatten() {
            let reference = match repo.find_reference(&format!("refs/tags/{}", name)) {
                Ok(reference) => reference,
                Err(_) => continue,
            };
            let notes = reference
                .peel(ObjectType::Tag)
                .ok()
                .and_then(|o| o.into_tag().ok())
                .and_then(|t| t.message().map(|m| m.trim().to_string()));
            let commit = match reference.peel_to_commit() {
                Ok(commit) => commit,
                Err(_) => {
                    debug!(tag = name, "skipping tag not pointing at a commit");
                    continue;
                }
            };
            tagged.push((
                commit.time().seconds(),
                HostedRelease {
                    name: None,
                    tag_name: name.to_string(),
                    sha: commit.id().to_string(),
                    notes,
                    url: None,
                },
            ));
        }

        // newest first, tag name as a stable tiebreak
        tagged.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.tag_name.cmp(&a.1.tag_name)));

        let total = tagged.len();
        let releases: Vec<HostedRelease> = tagged
            .into_iter()
            .skip(offset)
            .take(PAGE_SIZE)
            .map(|(_, release)| release)
            .collect();
        let end = offset + releases.len();
        let next = (end < total).then(|| end.to_string());
        Ok(Page::new(releases, next))
    }
}

fn parse_offset(cursor: Option<String>) -> std::result::Result<usize, HostingError> {
    match cursor {
        Some(cursor) => cursor
            .parse()
            .map_err(|_| HostingError::InvalidResponse(format!("invalid page cursor '{}'", cursor))),
        None => Ok(0),
    }
}

/// Resolve a branch name to its tip commit
fn resolve_branch<'r>(
    repo: &'r Repository,
    branch: &str,
) -> std::result::Result<git2::Commit<'r>, HostingError> {
    let candidates = [
        format!("refs/heads/{}", branch),
        format!("refs/remotes/origin/{}", branch),
    ];
    for name in &candidates {
        if let Ok(reference) = repo.find_reference(name) {
            return Ok(reference.peel_to_commit()?);
        }
    }
    repo.revparse_single(branch)
        .and_then(|o| o.peel_to_commit())
        .map_err(|_| HostingError::BranchNotFound(branch.to_string()))
}

/// Derive owner/name from the `origin` remote, falling back to the directory name
fn repository_info(repo: &Repository, path: &Path) -> RepositoryInfo {
    let default_branch = repo
        .head()
        .ok()
        .and_then(|head| head.shorthand().map(str::to_string))
        .filter(|name| name != "HEAD")
        .unwrap_or_else(|| "main".to_string());

    let from_remote = repo
        .find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().and_then(parse_remote_url));

    match from_remote {
        Some((owner, name)) => RepositoryInfo::new(owner, name, default_branch),
        None => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "repository".to_string());
            RepositoryInfo::new("local", name, default_branch)
        }
    }
}

/// Extract `(owner, repo)` from a remote url.
///
/// scp-like remotes (`git@host:owner/repo.git`) are not urls and only
/// have their path split off.
fn parse_remote_url(remote: &str) -> Option<(String, String)> {
    let path = match Url::parse(remote) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => remote.split_once(':')?.1.to_string(),
    };
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.rsplit('/');
    let repo = segments.next()?.to_string();
    let owner = segments.next()?.to_string();
    (!owner.is_empty() && !repo.is_empty() && !repo.contains(' ')).then_some((owner, repo))
}

#[async_trait]
impl Hosting for LocalRepository {
    fn repository(&self) -> &RepositoryInfo {
        &self.info
    }

    async fn file_contents_on_branch(&self, path: &str, branch: &str) -> Result<FileContents> {
        debug!(path, branch, "reading file from tree");
        Ok(self.read_file(path, branch)?)
    }

    async fn commits_page(&self, branch: &str, cursor: Option<String>) -> Result<Page<Commit>> {
        let offset = parse_offset(cursor)?;
        Ok(self.read_commits(branch, offset)?)
    }

    async fn releases_page(&self, cursor: Option<String>) -> Result<Page<HostedRelease>> {
        let offset = parse_offset(cursor)?;
        Ok(self.read_releases(offset)?)
    }

    async fn merged_pull_requests_page(
        &self,
        _branch: &str,
        _cursor: Option<String>,
    ) -> Result<Page<PullRequest>> {
        Ok(Page::last(Vec::new()))
    }

    async fn open_pull_request(
        &self,
        _request: &PullRequestRequest,
        _target_branch: &str,
    ) -> Result<u64> {
        Err(HostingError::Unsupported("opening pull requests".to_string()).into())
    }

    async fn create_release(&self, _request: &ReleaseRequest) -> Result<HostedRelease> {
        Err(HostingError::Unsupported("creating releases".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn commit(repo: &Repository, dir: &Path, path: &str, content: &str, message: &str) -> git2::Oid {
        let full = dir.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn setup() -> (TempDir, String) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        repo.remote("origin", "git@github.com:acme/rocket.git").unwrap();

        let first = commit(&repo, temp.path(), "package.json", "{\"version\":\"1.0.0\"}", "chore: init");
        let target = repo.find_object(first, None).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        repo.tag("v1.0.0", &target, &sig, "release 1.0.0", false).unwrap();

        commit(&repo, temp.path(), "src/lib.js", "x", "fix: bugfix");
        let branch = repo.head().unwrap().shorthand().unwrap().to_string();
        (temp, branch)
    }

    #[test]
    fn test_parse_remote_url() {
        assert_eq!(
            parse_remote_url("git@github.com:acme/rocket.git"),
            Some(("acme".to_string(), "rocket".to_string()))
        );
        assert_eq!(
            parse_remote_url("https://github.com/acme/rocket"),
            Some(("acme".to_string(), "rocket".to_string()))
        );
        assert_eq!(parse_remote_url("not a url"), None);
    }

    #[test]
    fn test_parse_remote_url_with_port() {
        assert_eq!(
            parse_remote_url("ssh://git@git.example.com:2222/acme/rocket.git"),
            Some(("acme".to_string(), "rocket".to_string()))
        );
        assert_eq!(
            parse_remote_url("https://git.example.com:8443/group/acme/rocket/"),
            Some(("acme".to_string(), "rocket".to_string()))
        );
        assert_eq!(parse_remote_url("https://git.example.com/rocket"), None);
    }

    #[test]
    fn test_open_missing_repo() {
        let temp = TempDir::new().unwrap();
        assert!(LocalRepository::open(temp.path()).is_err());
    }

    #[tokio::test]
    async fn test_reads_history_and_files() {
        let (temp, branch) = setup();
        let local = LocalRepository::open(temp.path()).unwrap();
        assert_eq!(local.repository().owner, "acme");
        assert_eq!(local.repository().repo, "rocket");
        assert_eq!(local.repository().default_branch, branch);

        let commits = local.merge_commits(&branch, 10).collect_all().await.unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "fix: bugfix");
        assert_eq!(commits[0].files, vec!["src/lib.js"]);

        let file = local
            .file_contents_on_branch("package.json", &branch)
            .await
            .unwrap();
        assert!(file.content.contains("1.0.0"));
        let missing = local
            .file_contents_on_branch("nope.txt", &branch)
            .await
            .unwrap_err();
        assert!(missing.is_file_not_found());
    }

    #[tokio::test]
    async fn test_releases_from_tags() {
        let (temp, _) = setup();
        let local = LocalRepository::open(temp.path()).unwrap();
        let releases = local.releases(10).collect_all().await.unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag_name, "v1.0.0");
        assert_eq!(releases[0].notes.as_deref(), Some("release 1.0.0"));
    }

    #[tokio::test]
    async fn test_mutations_unsupported() {
        let (temp, _) = setup();
        let local = LocalRepository::open(temp.path()).unwrap();
        let request = ReleaseRequest {
            tag_name: "v1.0.1".to_string(),
            sha: "abc".to_string(),
            name: "v1.0.1".to_string(),
            notes: String::new(),
            draft: false,
            prerelease: false,
        };
        assert!(local.create_release(&request).await.is_err());
    }
}
