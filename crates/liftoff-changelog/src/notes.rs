//! Release notes rendering

use std::sync::LazyLock;

use chrono::NaiveDate;
use liftoff_core::config::ChangelogSection;
use regex::Regex;
use tracing::{debug, instrument};

use crate::types::ClassifiedCommit;

/// Heading of the breaking changes section
const BREAKING_SECTION: &str = "⚠ BREAKING CHANGES";

/// Bare `#123` issue mentions in a subject
static ISSUE_MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[\s(])#(\d+)\b").expect("Invalid regex"));

/// Inputs of a release notes rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesContext {
    /// Hosting base URL (e.g. `https://github.com`)
    pub host: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repository: String,
    /// Version being released
    pub version: String,
    /// Tag of the previous release, used as compare base
    pub previous_tag: Option<String>,
    /// Tag of the new release
    pub current_tag: String,
    /// Branch the release is cut from
    pub target_branch: String,
    /// Release date
    pub date: NaiveDate,
    /// Type to section mapping
    pub changelog_sections: Vec<ChangelogSection>,
}

impl NotesContext {
    fn repository_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.host.trim_end_matches('/'),
            self.owner,
            self.repository
        )
    }
}

/// Trait for release notes renderers
pub trait NotesFormatter: Send + Sync {
    /// Render notes for the given commits
    fn format(&self, commits: &[ClassifiedCommit], context: &NotesContext) -> String;
}

/// Markdown release notes in the conventional changelog layout
#[derive(Debug, Default, Clone)]
pub struct MarkdownNotes;

impl MarkdownNotes {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self
    }

    fn header(&self, context: &NotesContext) -> String {
        let date = context.date.format("%Y-%m-%d");
        match &context.previous_tag {
            Some(previous) => format!(
                "## [{}]({}/compare/{}...{}) ({})",
                context.version,
                context.repository_url(),
                previous,
                context.current_tag,
                date
            ),
            None => format!("## {} ({})", context.version, date),
        }
    }

    fn entry(&self, commit: &ClassifiedCommit, text: &str, context: &NotesContext) -> String {
        let base = context.repository_url();
        let mut line = String::from("* ");
        if let Some(scope) = &commit.scope {
            line.push_str(&format!("**{}:** ", scope));
        }
        line.push_str(&link_issues(text, &base));
        line.push_str(&format!(
            " ([{}]({}/commit/{}))",
            commit.short_sha(),
            base,
            commit.sha
        ));

        for reference in commit.references.iter().filter(|r| r.action.is_some()) {
            let repo_url = match (&reference.owner, &reference.repository) {
                (Some(owner), Some(repo)) => format!(
                    "{}/{}/{}",
                    context.host.trim_end_matches('/'),
                    owner,
                    repo
                ),
                _ => base.clone(),
            };
            line.push_str(&format!(
                ", closes [{}{}]({}/issues/{})",
                reference.prefix, reference.issue, repo_url, reference.issue
            ));
        }
        line
    }
}

impl NotesFormatter for MarkdownNotes {
    #[instrument(skip_all, fields(version = %context.version, commit_count = commits.len()))]
    fn format(&self, commits: &[ClassifiedCommit], context: &NotesContext) -> String {
        let mut sections: Vec<(String, Vec<String>)> = Vec::new();

        let breaking: Vec<String> = commits
            .iter()
            .flat_map(|commit| {
                commit
                    .breaking_notes()
                    .map(move |text| self.entry_without_sha(commit, text))
            })
            .collect();
        if !breaking.is_empty() {
            sections.push((BREAKING_SECTION.to_string(), breaking));
        }

        for section in context.changelog_sections.iter().filter(|s| !s.hidden) {
            let entries: Vec<String> = commits
                .iter()
                .filter(|c| c.commit_type == section.commit_type)
                .map(|c| self.entry(c, &c.bare_message, context))
                .collect();
            if entries.is_empty() {
                continue;
            }
            match sections.iter_mut().find(|(title, _)| *title == section.section) {
                Some((_, existing)) => existing.extend(entries),
                None => sections.push((section.section.clone(), entries)),
            }
        }

        let mut output = self.header(context);
        for (title, entries) in &sections {
            output.push_str(&format!("\n\n\n### {}\n\n{}", title, entries.join("\n")));
        }

        debug!(
            sections = sections.len(),
            output_len = output.len(),
            "release notes rendered"
        );
        output
    }
}

impl MarkdownNotes {
    fn entry_without_sha(&self, commit: &ClassifiedCommit, text: &str) -> String {
        match &commit.scope {
            Some(scope) => format!("* **{}:** {}", scope, text),
            None => format!("* {}", text),
        }
    }
}

/// Render release notes with the markdown renderer
pub fn build_notes(commits: &[ClassifiedCommit], context: &NotesContext) -> String {
    MarkdownNotes::new().format(commits, context)
}

/// Whether any commit would show up in rendered notes
pub fn has_user_facing_changes(
    commits: &[ClassifiedCommit],
    sections: &[ChangelogSection],
) -> bool {
    commits.iter().any(|commit| {
        commit.breaking
            || sections
                .iter()
                .any(|s| !s.hidden && s.commit_type == commit.commit_type)
    })
}

fn link_issues(text: &str, base: &str) -> String {
    ISSUE_MENTION_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("{}[#{}]({}/issues/{})", &caps[1], &caps[2], base, &caps[2])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use liftoff_core::config::default_changelog_sections;
    use liftoff_git::Commit;

    fn context(previous_tag: Option<&str>) -> NotesContext {
        NotesContext {
            host: "https://github.com".to_string(),
            owner: "owner".to_string(),
            repository: "repo".to_string(),
            version: "1.2.0".to_string(),
            previous_tag: previous_tag.map(str::to_string),
            current_tag: "v1.2.0".to_string(),
            target_branch: "main".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            changelog_sections: default_changelog_sections(),
        }
    }

    fn commits(messages: &[(&str, &str)]) -> Vec<ClassifiedCommit> {
        let raw: Vec<Commit> = messages
            .iter()
            .map(|(sha, message)| Commit::new(*sha, *message))
            .collect();
        classify(&raw)
    }

    #[test]
    fn test_notes_layout() {
        let commits = commits(&[
            ("aaaaaaa1111", "feat(api): add endpoint"),
            ("bbbbbbb2222", "fix: bugfix"),
            ("ccccccc3333", "chore: tidy"),
        ]);
        let notes = build_notes(&commits, &context(Some("v1.1.0")));
        assert_eq!(
            notes,
            "## [1.2.0](https://github.com/owner/repo/compare/v1.1.0...v1.2.0) (2024-01-02)\n\n\n\
             ### Features\n\n\
             * **api:** add endpoint ([aaaaaaa](https://github.com/owner/repo/commit/aaaaaaa1111))\n\n\n\
             ### Bug Fixes\n\n\
             * bugfix ([bbbbbbb](https://github.com/owner/repo/commit/bbbbbbb2222))"
        );
    }

    #[test]
    fn test_header_without_previous_tag() {
        let notes = build_notes(&commits(&[("abc1234", "fix: x")]), &context(None));
        assert!(notes.starts_with("## 1.2.0 (2024-01-02)\n"));
    }

    #[test]
    fn test_breaking_changes_come_first() {
        let commits = commits(&[
            ("abc1234", "fix: small"),
            ("def5678", "refactor(core)!: rename everything"),
        ]);
        let notes = build_notes(&commits, &context(None));
        let breaking = notes.find("### ⚠ BREAKING CHANGES").unwrap();
        let fixes = notes.find("### Bug Fixes").unwrap();
        assert!(breaking < fixes);
        assert!(notes.contains("* **core:** rename everything\n"));
        // refactor is hidden, so it only shows up as a breaking note
        assert!(!notes.contains("Code Refactoring"));
    }

    #[test]
    fn test_issue_links() {
        let commits = commits(&[("abc1234", "fix: handle nulls (#12)\n\nCloses #13")]);
        let notes = build_notes(&commits, &context(None));
        assert!(notes.contains("handle nulls ([#12](https://github.com/owner/repo/issues/12))"));
        assert!(notes.contains(", closes [#13](https://github.com/owner/repo/issues/13)"));
    }

    #[test]
    fn test_deterministic() {
        let commits = commits(&[("abc1234", "feat: a"), ("def5678", "fix: b")]);
        let ctx = context(Some("v1.1.0"));
        assert_eq!(build_notes(&commits, &ctx), build_notes(&commits, &ctx));
    }

    #[test]
    fn test_user_facing_changes() {
        let sections = default_changelog_sections();
        assert!(!has_user_facing_changes(
            &commits(&[("abc1234", "chore: release 1.0.0")]),
            &sections
        ));
        assert!(has_user_facing_changes(
            &commits(&[("abc1234", "chore!: drop support")]),
            &sections
        ));
        assert!(has_user_facing_changes(&commits(&[("abc1234", "perf: faster")]), &sections));
    }
}
