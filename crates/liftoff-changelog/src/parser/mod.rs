//! Commit message grammar

mod conventional;

pub use conventional::ConventionalParser;

use crate::types::Footer;

/// A commit message split into its grammatical parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Commit type, lowercased
    pub commit_type: String,
    /// Optional scope
    pub scope: Option<String>,
    /// Whether the header carries the `!` breaking marker
    pub breaking: bool,
    /// Header description
    pub subject: String,
    /// Body text between header and footers
    pub body: Option<String>,
    /// Footer fields in order of appearance
    pub footers: Vec<Footer>,
}

/// Trait for commit message parsers
pub trait CommitParser: Send + Sync {
    /// Parse a single commit message, `None` when it does not follow the grammar
    fn parse(&self, message: &str) -> Option<ParsedMessage>;

    /// Whether a paragraph starting with `line` opens another commit
    /// inside the same message
    fn starts_commit(&self, line: &str) -> bool;
}
