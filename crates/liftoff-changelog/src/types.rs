//! Classified commit types

use liftoff_git::PullRequest;
use serde::{Deserialize, Serialize};

/// Note title carrying breaking change descriptions
pub const BREAKING_CHANGE_NOTE: &str = "BREAKING CHANGE";

/// Note title carrying an explicit `Release-As` version
pub const RELEASE_AS_NOTE: &str = "RELEASE AS";

/// A footer field of a commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    /// Footer token (e.g. "BREAKING CHANGE", "Refs", "Release-As")
    pub token: String,
    /// Raw footer value, continuation lines included
    pub value: String,
}

/// A titled note attached to a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note title
    pub title: String,
    /// Note text
    pub text: String,
}

impl Note {
    /// Create a note
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// An issue reference found in a commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Closing keyword ("closes", "fixes", ...), when present
    pub action: Option<String>,
    /// Repository owner for cross-repository references
    pub owner: Option<String>,
    /// Repository name for cross-repository references
    pub repository: Option<String>,
    /// Issue number
    pub issue: String,
    /// Issue prefix
    pub prefix: String,
}

/// A commit classified against the conventional commit grammar.
///
/// One raw commit can yield several classified commits when its message
/// carries several conventional headers; they share sha, files and pull
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCommit {
    /// Commit hash
    pub sha: String,
    /// Files touched by the raw commit
    pub files: Vec<String>,
    /// Pull request the commit was merged from
    pub pull_request: Option<PullRequest>,
    /// Commit type (feat, fix, ...), lowercased
    #[serde(rename = "type")]
    pub commit_type: String,
    /// Optional scope
    pub scope: Option<String>,
    /// Header description without type and scope
    pub bare_message: String,
    /// Whether the commit is a breaking change
    pub breaking: bool,
    /// Notes (breaking changes, release-as)
    pub notes: Vec<Note>,
    /// Issue references
    pub references: Vec<Reference>,
}

impl ClassifiedCommit {
    /// Texts of breaking change notes
    pub fn breaking_notes(&self) -> impl Iterator<Item = &str> {
        self.notes
            .iter()
            .filter(|n| n.title == BREAKING_CHANGE_NOTE)
            .map(|n| n.text.as_str())
    }

    /// Version requested by a `Release-As` footer
    pub fn release_as(&self) -> Option<&str> {
        self.notes
            .iter()
            .find(|n| n.title == RELEASE_AS_NOTE)
            .map(|n| n.text.as_str())
    }

    /// Whether this is a `feat` commit
    pub fn is_feature(&self) -> bool {
        matches!(self.commit_type.as_str(), "feat" | "feature")
    }

    /// Short hash (first 7 characters)
    pub fn short_sha(&self) -> &str {
        let end = self.sha.len().min(7);
        &self.sha[..end]
    }
}
