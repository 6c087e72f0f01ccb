//! Hosting types

use serde::{Deserialize, Serialize};

/// Identity of the hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Default branch
    pub default_branch: String,
}

impl RepositoryInfo {
    /// Create repository info
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            default_branch: default_branch.into(),
        }
    }
}

/// A merged commit on the target branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit hash (full)
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Files changed by the commit, repository-relative
    pub files: Vec<String>,
    /// Pull request the commit was merged from
    pub pull_request: Option<PullRequest>,
}

impl Commit {
    /// Create a new commit without files
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            message: message.into(),
            files: Vec::new(),
            pull_request: None,
        }
    }

    /// Set the changed files
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the associated pull request
    pub fn with_pull_request(mut self, pull_request: PullRequest) -> Self {
        self.pull_request = Some(pull_request);
        self
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Short hash (first 7 characters)
    pub fn short_sha(&self) -> &str {
        let end = self.sha.len().min(7);
        &self.sha[..end]
    }
}

/// A pull request as seen by the hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number
    pub number: u64,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Head branch name
    pub head_branch: String,
    /// Base branch name
    pub base_branch: String,
    /// Labels
    pub labels: Vec<String>,
    /// Merge commit, when merged
    pub merge_commit_sha: Option<String>,
    /// Files touched by the pull request
    pub files: Vec<String>,
}

impl PullRequest {
    /// Create a pull request record
    pub fn new(
        number: u64,
        title: impl Into<String>,
        body: impl Into<String>,
        head_branch: impl Into<String>,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            number,
            title: title.into(),
            body: body.into(),
            head_branch: head_branch.into(),
            base_branch: base_branch.into(),
            labels: Vec::new(),
            merge_commit_sha: None,
            files: Vec::new(),
        }
    }

    /// Set the merge commit
    pub fn with_merge_commit(mut self, sha: impl Into<String>) -> Self {
        self.merge_commit_sha = Some(sha.into());
        self
    }

    /// Set labels
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// A file fetched from a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContents {
    /// Decoded file content
    pub content: String,
    /// Blob hash
    pub sha: String,
}

impl FileContents {
    /// Build file contents, hashing the content as a git blob
    pub fn from_content(content: impl Into<String>) -> Self {
        let content = content.into();
        let sha = git2::Oid::hash_object(git2::ObjectType::Blob, content.as_bytes())
            .map(|oid| oid.to_string())
            .unwrap_or_default();
        Self { content, sha }
    }
}

/// A published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedRelease {
    /// Release name
    pub name: Option<String>,
    /// Tag name
    pub tag_name: String,
    /// Tagged commit
    pub sha: String,
    /// Release notes
    pub notes: Option<String>,
    /// URL of the release, when hosted
    pub url: Option<String>,
}

/// A file written by a release pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative path
    pub path: String,
    /// New content
    pub content: String,
}

/// Request to open or refresh a release pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRequest {
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Head branch
    pub head_branch: String,
    /// Labels
    pub labels: Vec<String>,
    /// Open as draft
    pub draft: bool,
    /// Files to commit on the head branch
    pub changes: Vec<FileChange>,
}

/// Request to create a tag and release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    /// Tag name
    pub tag_name: String,
    /// Commit to tag
    pub sha: String,
    /// Release name
    pub name: String,
    /// Release notes
    pub notes: String,
    /// Draft release
    pub draft: bool,
    /// Pre-release
    pub prerelease: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_summary() {
        let commit = Commit::new("abc1234567890", "feat: add feature\n\nbody text");
        assert_eq!(commit.summary(), "feat: add feature");
        assert_eq!(commit.short_sha(), "abc1234");
    }

    #[test]
    fn test_file_contents_sha_matches_git() {
        // `printf 'hello\n' | git hash-object --stdin`
        let contents = FileContents::from_content("hello\n");
        assert_eq!(contents.sha, "ce013625030ba8dba906f756967f9e9ca394464a");
    }
}
