//! Conventional Commits parser
//!
//! Parses commits following the Conventional Commits specification:
//! https://www.conventionalcommits.org/

use regex::Regex;
use std::sync::LazyLock;

use super::{CommitParser, ParsedMessage};
use crate::types::Footer;

/// Regex for parsing conventional commit headers
static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?:\s+(?P<description>.+)$",
    )
    .expect("Invalid regex")
});

/// Regex for `Token: value` footer lines
static FOOTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<token>BREAKING[ -]CHANGE|[A-Za-z][A-Za-z-]*):\s+(?P<value>.*)$")
        .expect("Invalid regex")
});

/// Regex for `Token #123` footer lines
static ISSUE_FOOTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<token>[A-Za-z][A-Za-z-]*) (?P<value>#\d+.*)$").expect("Invalid regex")
});

/// Parser for Conventional Commits format
#[derive(Debug, Default, Clone)]
pub struct ConventionalParser;

impl ConventionalParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    fn parse_footer(line: &str) -> Option<Footer> {
        let caps = FOOTER_REGEX
            .captures(line)
            .or_else(|| ISSUE_FOOTER_REGEX.captures(line))?;
        Some(Footer {
            token: caps.name("token")?.as_str().to_string(),
            value: caps.name("value")?.as_str().to_string(),
        })
    }

    /// Split the lines after the header into body and footers.
    ///
    /// Footers start at the first footer-shaped line that opens a
    /// paragraph; every following line that is not itself a footer is kept
    /// verbatim as a continuation of the previous footer.
    fn parse_body<'a, I>(lines: I) -> (Option<String>, Vec<Footer>)
    where
        I: Iterator<Item = &'a str>,
    {
        let mut body_lines = Vec::new();
        let mut footers: Vec<Footer> = Vec::new();
        let mut previous_blank = true;

        for line in lines {
            let opens_footer = previous_blank || !footers.is_empty();
            if let Some(footer) = Self::parse_footer(line).filter(|_| opens_footer) {
                footers.push(footer);
            } else if let Some(last) = footers.last_mut() {
                last.value.push('\n');
                last.value.push_str(line);
            } else {
                body_lines.push(line);
            }
            previous_blank = line.trim().is_empty();
        }

        for footer in &mut footers {
            let trimmed = footer.value.trim_end().len();
            footer.value.truncate(trimmed);
        }

        let body = body_lines.join("\n").trim().to_string();
        ((!body.is_empty()).then_some(body), footers)
    }
}

impl CommitParser for ConventionalParser {
    fn parse(&self, message: &str) -> Option<ParsedMessage> {
        let mut lines = message.lines();
        let header = lines.next()?.trim();
        let caps = HEADER_REGEX.captures(header)?;

        let (body, footers) = Self::parse_body(lines);

        Some(ParsedMessage {
            commit_type: caps.name("type")?.as_str().to_lowercase(),
            scope: caps
                .name("scope")
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty()),
            breaking: caps.name("breaking").is_some(),
            subject: caps.name("description")?.as_str().trim().to_string(),
            body,
            footers,
        })
    }

    fn starts_commit(&self, line: &str) -> bool {
        // footer tokens are capitalised, nested headers use lowercase types
        HEADER_REGEX
            .captures(line.trim())
            .and_then(|caps| caps.name("type"))
            .map(|t| t.as_str().chars().all(|c| c.is_ascii_lowercase()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(message: &str) -> Option<ParsedMessage> {
        ConventionalParser::new().parse(message)
    }

    #[test]
    fn test_parse_simple_feat() {
        let parsed = parse("feat: add new feature").unwrap();
        assert_eq!(parsed.commit_type, "feat");
        assert_eq!(parsed.subject, "add new feature");
        assert!(parsed.scope.is_none());
        assert!(!parsed.breaking);
    }

    #[test]
    fn test_parse_with_scope_and_marker() {
        let parsed = parse("refactor(core)!: major refactoring").unwrap();
        assert_eq!(parsed.commit_type, "refactor");
        assert_eq!(parsed.scope.as_deref(), Some("core"));
        assert!(parsed.breaking);
    }

    #[test]
    fn test_parse_non_conventional() {
        assert!(parse("Just a regular commit message").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_parse_body_and_footers() {
        let parsed = parse("feat: add feature\n\nBody text\n\nRefs: #123\nFixes #456").unwrap();
        assert_eq!(parsed.body.as_deref(), Some("Body text"));
        assert_eq!(parsed.footers.len(), 2);
        assert_eq!(parsed.footers[0].token, "Refs");
        assert_eq!(parsed.footers[0].value, "#123");
        assert_eq!(parsed.footers[1].token, "Fixes");
        assert_eq!(parsed.footers[1].value, "#456");
    }

    #[test]
    fn test_breaking_footer_keeps_continuation() {
        let parsed =
            parse("feat: x\n\nBREAKING CHANGE: first line\nsecond line\n\nmore text\n").unwrap();
        assert_eq!(parsed.footers.len(), 1);
        assert_eq!(parsed.footers[0].token, "BREAKING CHANGE");
        assert_eq!(
            parsed.footers[0].value,
            "first line\nsecond line\n\nmore text"
        );
    }

    #[test]
    fn test_footer_needs_paragraph_start() {
        let parsed = parse("fix: x\n\nsome text\nNote: inline").unwrap();
        assert!(parsed.footers.is_empty());
        assert_eq!(parsed.body.as_deref(), Some("some text\nNote: inline"));
    }

    #[test]
    fn test_starts_commit() {
        let parser = ConventionalParser::new();
        assert!(parser.starts_commit("fix(deps): update foo"));
        assert!(!parser.starts_commit("Release-As: 2.0.0"));
        assert!(!parser.starts_commit("Refs: #12"));
        assert!(!parser.starts_commit("plain text"));
    }
}
