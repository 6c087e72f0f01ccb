//! Commit classification
//!
//! Expands raw commits into classified conventional commits: meta commits
//! are split, breaking change notes are normalised, `Release-As` footers
//! become notes and issue references are collected.

use std::sync::{Arc, LazyLock};

use liftoff_git::Commit;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::parser::{CommitParser, ConventionalParser, ParsedMessage};
use crate::types::{ClassifiedCommit, Note, Reference, BREAKING_CHANGE_NOTE, RELEASE_AS_NOTE};

/// Issue references such as `#12`, `owner/repo#12` or `Fixes #12`
static REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?P<action>close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+)?(?:(?P<owner>[\w.-]+)/(?P<repo>[\w.-]+))?#(?P<issue>\d+)",
    )
    .expect("Invalid regex")
});

/// Commit message override embedded in a pull request body
static OVERRIDE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)BEGIN_COMMIT_OVERRIDE\s*\n(?P<message>.*?)\n\s*END_COMMIT_OVERRIDE")
        .expect("Invalid regex")
});

/// Ordered list item at the start of a line
static ORDERED_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s").expect("Invalid regex"));

/// Classifies raw commits with a pluggable grammar
#[derive(Clone)]
pub struct Classifier {
    parser: Arc<dyn CommitParser>,
}

impl Classifier {
    /// Create a classifier using the conventional commit grammar
    pub fn new() -> Self {
        Self {
            parser: Arc::new(ConventionalParser::new()),
        }
    }

    /// Use a custom parser
    pub fn with_parser<P: CommitParser + 'static>(parser: P) -> Self {
        Self {
            parser: Arc::new(parser),
        }
    }

    /// Classify commits, preserving order.
    ///
    /// Merge commits and messages that do not follow the grammar are
    /// skipped.
    #[instrument(skip_all, fields(commit_count = commits.len()))]
    pub fn classify(&self, commits: &[Commit]) -> Vec<ClassifiedCommit> {
        let mut classified = Vec::new();

        for commit in commits {
            let message = override_message(commit).unwrap_or(&commit.message);

            if is_merge_header(message) {
                debug!(sha = %commit.short_sha(), "skipping merge commit");
                continue;
            }

            for part in self.split_message(message) {
                match self.parser.parse(&part) {
                    Some(parsed) => classified.push(to_classified(commit, parsed)),
                    None => warn!(
                        sha = %commit.short_sha(),
                        summary = part.lines().next().unwrap_or_default(),
                        "commit could not be parsed"
                    ),
                }
            }
        }

        debug!(count = classified.len(), "classified commits");
        classified
    }

    /// Split a message into one message per nested conventional header.
    ///
    /// A paragraph whose first line opens a commit starts a new message;
    /// other paragraphs stay with the message before them.
    fn split_message(&self, message: &str) -> Vec<String> {
        let mut parts: Vec<Vec<&str>> = Vec::new();
        let mut previous_blank = true;

        for line in message.lines() {
            let opens = parts.is_empty() || (previous_blank && self.parser.starts_commit(line));
            if opens {
                parts.push(vec![line]);
            } else if let Some(current) = parts.last_mut() {
                current.push(line);
            }
            previous_blank = line.trim().is_empty();
        }

        parts
            .into_iter()
            .map(|lines| lines.join("\n").trim_end().to_string())
            .filter(|part| !part.trim().is_empty())
            .collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify commits with the conventional commit grammar
pub fn classify(commits: &[Commit]) -> Vec<ClassifiedCommit> {
    Classifier::new().classify(commits)
}

fn override_message(commit: &Commit) -> Option<&str> {
    let body = &commit.pull_request.as_ref()?.body;
    let message = OVERRIDE_REGEX.captures(body)?.name("message")?.as_str().trim();
    (!message.is_empty()).then_some(message)
}

fn is_merge_header(message: &str) -> bool {
    let header = message.lines().next().unwrap_or_default();
    header.starts_with("Merge pull request ")
        || header.starts_with("Merge branch ")
        || header.starts_with("Merge remote-tracking branch ")
}

fn to_classified(commit: &Commit, parsed: ParsedMessage) -> ClassifiedCommit {
    let mut notes = Vec::new();
    for footer in &parsed.footers {
        let token = footer.token.to_ascii_uppercase();
        if token == "BREAKING CHANGE" || token == "BREAKING-CHANGE" {
            notes.push(Note::new(
                BREAKING_CHANGE_NOTE,
                normalize_breaking_text(&footer.value),
            ));
        } else if token == "RELEASE-AS" {
            let version = footer.value.lines().next().unwrap_or_default().trim();
            notes.push(Note::new(RELEASE_AS_NOTE, version));
        }
    }

    let has_breaking_note = notes.iter().any(|n| n.title == BREAKING_CHANGE_NOTE);
    if parsed.breaking && !has_breaking_note {
        notes.push(Note::new(BREAKING_CHANGE_NOTE, parsed.subject.clone()));
    }

    let footer_lines: Vec<String> = parsed
        .footers
        .iter()
        .map(|f| format!("{} {}", f.token, f.value))
        .collect();
    let mut texts = vec![parsed.subject.as_str()];
    texts.extend(parsed.body.as_deref());
    texts.extend(footer_lines.iter().map(String::as_str));
    let references = extract_references(texts);

    ClassifiedCommit {
        sha: commit.sha.clone(),
        files: commit.files.clone(),
        pull_request: commit.pull_request.clone(),
        commit_type: parsed.commit_type,
        scope: parsed.scope,
        bare_message: parsed.subject,
        breaking: parsed.breaking || has_breaking_note,
        notes,
        references,
    }
}

/// Trim a breaking change note to its first paragraph.
///
/// A following paragraph is kept only while it is a markdown heading or
/// list: its items and their indented continuation lines are kept
/// verbatim, and the note ends at the first line that is neither.
fn normalize_breaking_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let mut kept: Vec<&str> = Vec::new();
    let mut in_block = false;
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        if line.trim().is_empty() {
            let Some(next) = lines[index..]
                .iter()
                .position(|l| !l.trim().is_empty())
                .map(|offset| index + offset)
            else {
                break;
            };
            if !is_markdown_block(lines[next]) && !(in_block && is_indented(lines[next])) {
                break;
            }
            kept.extend(&lines[index..next]);
            in_block = true;
            index = next;
            continue;
        }
        if in_block && !is_markdown_block(line) && !is_indented(line) {
            break;
        }
        kept.push(line);
        index += 1;
    }

    kept.join("\n").trim().to_string()
}

fn is_indented(line: &str) -> bool {
    line.starts_with(char::is_whitespace)
}

fn is_markdown_block(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#')
        || trimmed.starts_with("- ")
        || trimmed.starts_with("* ")
        || trimmed.starts_with("+ ")
        || ORDERED_ITEM_REGEX.is_match(trimmed)
}

fn extract_references<'a, I>(texts: I) -> Vec<Reference>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut references: Vec<Reference> = Vec::new();
    for text in texts {
        for caps in REFERENCE_REGEX.captures_iter(text) {
            let Some(issue) = caps.name("issue") else {
                continue;
            };
            let reference = Reference {
                action: caps.name("action").map(|m| m.as_str().to_lowercase()),
                owner: caps.name("owner").map(|m| m.as_str().to_string()),
                repository: caps.name("repo").map(|m| m.as_str().to_string()),
                issue: issue.as_str().to_string(),
                prefix: "#".to_string(),
            };

            match references.iter_mut().find(|r| {
                r.issue == reference.issue
                    && r.owner == reference.owner
                    && r.repository == reference.repository
            }) {
                Some(existing) if existing.action.is_none() => existing.action = reference.action,
                Some(_) => {}
                None => references.push(reference),
            }
        }
    }
    references
}
