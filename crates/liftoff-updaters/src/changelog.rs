//! Changelog updaters
//!
//! New entries are inserted above the newest release entry so that the
//! changelog reads newest first. Re-running an updater for a version that
//! is already the newest entry replaces that entry instead of adding a
//! second one.

use std::sync::LazyLock;

use liftoff_core::{Result, UpdaterError, Version};
use regex::Regex;
use tracing::{debug, warn};

use crate::traits::Updater;

/// Heading of the workspace dependency section
pub const DEPENDENCIES_HEADING: &str = "### Dependencies";

const CHANGELOG_TITLE: &str = "# Changelog";

/// Start of a release entry (`## 1.2.3`, `## [1.2.3]`, `### v1.2.3`)
static VERSION_HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###? v?[0-9\[]").expect("Invalid regex"));

/// Inserts a release entry into a changelog
#[derive(Debug, Clone)]
pub struct ChangelogUpdater {
    version: Version,
    entry: String,
}

impl ChangelogUpdater {
    /// Create an updater inserting `entry` for `version`
    pub fn new(version: Version, entry: impl Into<String>) -> Self {
        Self {
            version,
            entry: entry.into().trim().to_string(),
        }
    }
}

impl Updater for ChangelogUpdater {
    fn name(&self) -> &'static str {
        "changelog"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content.unwrap_or_default();
        if content.trim().is_empty() {
            debug!(version = %self.version, "creating changelog");
            return Ok(format!("{}\n\n{}\n", CHANGELOG_TITLE, self.entry));
        }

        let headers = entry_starts(content);
        let Some(&first) = headers.first() else {
            return Ok(format!("{}\n\n{}\n", content.trim_end(), self.entry));
        };

        let (before, mut rest) = content.split_at(first);
        if header_is_for(first_line(rest), &self.version) {
            debug!(version = %self.version, "replacing existing changelog entry");
            rest = &content[headers.get(1).copied().unwrap_or(content.len())..];
        }

        let before = before.trim_end();
        let output = match (before.is_empty(), rest.is_empty()) {
            (true, true) => format!("{}\n", self.entry),
            (true, false) => format!("{}\n\n{}", self.entry, rest),
            (false, true) => format!("{}\n\n{}\n", before, self.entry),
            (false, false) => format!("{}\n\n{}\n\n{}", before, self.entry, rest),
        };
        Ok(output)
    }
}

/// Merges workspace dependency notes into the entry of one version
#[derive(Debug, Clone)]
pub struct DependencyNotesUpdater {
    version: Version,
    notes: String,
}

impl DependencyNotesUpdater {
    /// Create an updater merging `notes` into the entry of `version`
    pub fn new(version: Version, notes: impl Into<String>) -> Self {
        Self {
            version,
            notes: notes.into(),
        }
    }
}

impl Updater for DependencyNotesUpdater {
    fn name(&self) -> &'static str {
        "changelog-dependencies"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent("changelog".to_string()))?;

        let headers = entry_starts(content);
        let Some(position) = headers
            .iter()
            .position(|&start| header_is_for(first_line(&content[start..]), &self.version))
        else {
            warn!(version = %self.version, "no changelog entry to add dependency notes to");
            return Ok(content.to_string());
        };

        let start = headers[position];
        let end = headers.get(position + 1).copied().unwrap_or(content.len());
        let entry = &content[start..end];
        let trimmed = entry.trim_end();

        Ok(format!(
            "{}{}{}{}",
            &content[..start],
            merge_dependency_notes(trimmed, &self.notes),
            &entry[trimmed.len()..],
            &content[end..]
        ))
    }
}

/// Merge dependency notes into release notes.
///
/// When the notes already carry a `### Dependencies` section, the bullet
/// list following the blank line after its header is merged with the new
/// bullets: a bullet already present under the same parent is reused and
/// only its missing children are added. The list ends at the first line
/// that is not part of a bullet. Without a section, a new one is appended.
/// Merging the same notes twice is a no-op.
pub fn merge_dependency_notes(existing: &str, notes: &str) -> String {
    let notes = notes.trim_end();
    let lines: Vec<&str> = existing.split('\n').collect();
    let Some(heading) = lines
        .iter()
        .position(|line| line.trim_end() == DEPENDENCIES_HEADING)
    else {
        if existing.trim().is_empty() {
            return format!("{}\n\n{}", DEPENDENCIES_HEADING, notes);
        }
        return format!(
            "{}\n\n\n{}\n\n{}",
            existing.trim_end(),
            DEPENDENCIES_HEADING,
            notes
        );
    };

    let mut start = heading + 1;
    while start < lines.len() && lines[start].trim().is_empty() {
        start += 1;
    }
    let end = lines[start..]
        .iter()
        .position(|line| !is_bullet_line(line))
        .map_or(lines.len(), |offset| start + offset);

    let current = &lines[start..end];
    let mut bullets = parse_bullets(current);
    let additions: Vec<&str> = notes.split('\n').filter(|line| !line.trim().is_empty()).collect();
    merge_bullets(&mut bullets, parse_bullets(&additions));

    let mut rendered = Vec::new();
    render_bullets(&bullets, &mut rendered);
    if rendered == current {
        return existing.to_string();
    }

    let mut output: Vec<&str> = lines[..start].to_vec();
    if current.is_empty() && start == heading + 1 {
        output.push("");
    }
    output.extend(rendered);
    if current.is_empty() && lines.get(end).is_some_and(|line| !line.trim().is_empty()) {
        output.push("");
    }
    output.extend(&lines[end..]);
    output.join("\n")
}

/// One bullet line and the lines nested below it
#[derive(Debug)]
struct Bullet<'a> {
    line: &'a str,
    children: Vec<Bullet<'a>>,
}

fn is_bullet_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty()
        && (trimmed.starts_with("* ") || trimmed.starts_with("- ") || trimmed.len() < line.len())
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn parse_bullets<'a>(lines: &[&'a str]) -> Vec<Bullet<'a>> {
    let mut bullets = Vec::new();
    let mut index = 0;
    while index < lines.len() {
        let indent = indent_of(lines[index]);
        let nested = lines[index + 1..]
            .iter()
            .position(|line| indent_of(line) <= indent)
            .map_or(lines.len(), |offset| index + 1 + offset);
        bullets.push(Bullet {
            line: lines[index],
            children: parse_bullets(&lines[index + 1..nested]),
        });
        index = nested;
    }
    bullets
}

fn merge_bullets<'a>(existing: &mut Vec<Bullet<'a>>, additions: Vec<Bullet<'a>>) {
    for addition in additions {
        match existing
            .iter_mut()
            .find(|bullet| bullet.line.trim_end() == addition.line.trim_end())
        {
            Some(bullet) => merge_bullets(&mut bullet.children, addition.children),
            None => existing.push(addition),
        }
    }
}

fn render_bullets<'a>(bullets: &[Bullet<'a>], output: &mut Vec<&'a str>) {
    for bullet in bullets {
        output.push(bullet.line);
        render_bullets(&bullet.children, output);
    }
}

fn entry_starts(content: &str) -> Vec<usize> {
    VERSION_HEADER_REGEX
        .find_iter(content)
        .map(|m| m.start())
        .collect()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn header_is_for(header: &str, version: &Version) -> bool {
    let version = version.to_string();
    header.contains(&format!("[{}]", version))
        || header
            .split_whitespace()
            .nth(1)
            .is_some_and(|token| token.trim_start_matches('v') == version)
}

fn find_heading(text: &str, heading: &str) -> Option<usize> {
    text.match_indices(heading)
        .map(|(index, _)| index)
        .find(|&index| {
            let starts_line = index == 0 || text[..index].ends_with('\n');
            let rest = &text[index + heading.len()..];
            starts_line && (rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPS: &str = "* The following workspace dependencies were updated\n  * dependencies\n    * pkgA bumped from 1.0.0 to 1.0.1";

    fn entry(version: &str) -> String {
        format!("## [{0}](https://github.com/o/r/compare/v0...v{0}) (2024-01-01)\n\n\n### Bug Fixes\n\n* fix {0}", version)
    }

    #[test]
    fn test_creates_missing_changelog() {
        let updater = ChangelogUpdater::new(Version::new(1, 0, 0), entry("1.0.0"));
        let output = updater.update_content(None).unwrap();
        assert_eq!(output, format!("# Changelog\n\n{}\n", entry("1.0.0")));
    }

    #[test]
    fn test_inserts_before_previous_entry() {
        let existing = format!("# Changelog\n\n{}\n", entry("1.0.0"));
        let updater = ChangelogUpdater::new(Version::new(1, 0, 1), entry("1.0.1"));
        let output = updater.update_content(Some(&existing)).unwrap();
        assert_eq!(
            output,
            format!("# Changelog\n\n{}\n\n{}\n", entry("1.0.1"), entry("1.0.0"))
        );
    }

    #[test]
    fn test_inserting_twice_is_idempotent() {
        let existing = format!("# Changelog\n\n{}\n", entry("1.0.0"));
        let updater = ChangelogUpdater::new(Version::new(1, 0, 1), entry("1.0.1"));
        let once = updater.update_content(Some(&existing)).unwrap();
        let twice = updater.update_content(Some(&once)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_header_without_entries() {
        let updater = ChangelogUpdater::new(Version::new(0, 1, 0), "## 0.1.0 (2024-01-01)");
        let output = updater.update_content(Some("# Changelog\n")).unwrap();
        assert_eq!(output, "# Changelog\n\n## 0.1.0 (2024-01-01)\n");
    }

    #[test]
    fn test_merge_appends_new_section() {
        let merged = merge_dependency_notes("## 1.0.1\n\n\n### Bug Fixes\n\n* fix", DEPS);
        assert_eq!(
            merged,
            format!("## 1.0.1\n\n\n### Bug Fixes\n\n* fix\n\n\n### Dependencies\n\n{}", DEPS)
        );
        assert_eq!(
            merge_dependency_notes("", DEPS),
            format!("### Dependencies\n\n{}", DEPS)
        );
    }

    #[test]
    fn test_merge_splices_into_existing_section() {
        let existing = format!("## 1.0.1\n\n\n### Dependencies\n\n{}\n\n\n### Bug Fixes\n\n* fix", DEPS);
        let extra = "* The following workspace dependencies were updated\n  * dependencies\n    * pkgB bumped from 2.0.0 to 2.0.1";
        let merged = merge_dependency_notes(&existing, extra);
        assert_eq!(
            merged,
            format!(
                "## 1.0.1\n\n\n### Dependencies\n\n{}\n    * pkgB bumped from 2.0.0 to 2.0.1\n\n\n### Bug Fixes\n\n* fix",
                DEPS
            )
        );
    }

    #[test]
    fn test_merge_stops_before_trailing_paragraph() {
        let existing = "## 1.0.1\n\n### Dependencies\n\n* pkgA bumped\n\nTrailing paragraph";
        let merged = merge_dependency_notes(existing, "* pkgB bumped");
        assert_eq!(
            merged,
            "## 1.0.1\n\n### Dependencies\n\n* pkgA bumped\n* pkgB bumped\n\nTrailing paragraph"
        );
    }

    #[test]
    fn test_merge_keeps_dependency_kinds_apart() {
        let existing = "### Dependencies\n\n* The following workspace dependencies were updated\n  * dependencies\n    * pkgA bumped from 1.0.0 to 1.0.1\n  * devDependencies\n    * pkgC bumped from 3.0.0 to 3.0.1";
        let extra = "* The following workspace dependencies were updated\n  * dependencies\n    * pkgB bumped from 2.0.0 to 2.0.1";
        let merged = merge_dependency_notes(existing, extra);
        assert_eq!(
            merged,
            "### Dependencies\n\n* The following workspace dependencies were updated\n  * dependencies\n    * pkgA bumped from 1.0.0 to 1.0.1\n    * pkgB bumped from 2.0.0 to 2.0.1\n  * devDependencies\n    * pkgC bumped from 3.0.0 to 3.0.1"
        );
    }

    #[test]
    fn test_merge_into_empty_section() {
        let merged = merge_dependency_notes("### Dependencies\n\nSee below", "* pkgB bumped");
        assert_eq!(merged, "### Dependencies\n\n* pkgB bumped\n\nSee below");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merge_dependency_notes("## 1.0.1\n\n\n### Bug Fixes\n\n* fix", DEPS);
        assert_eq!(merge_dependency_notes(&once, DEPS), once);
    }

    #[test]
    fn test_dependency_notes_target_one_entry() {
        let content = format!("# Changelog\n\n{}\n\n{}\n", entry("1.0.1"), entry("1.0.0"));
        let updater = DependencyNotesUpdater::new(Version::new(1, 0, 1), DEPS);
        let output = updater.update_content(Some(&content)).unwrap();

        let deps = output.find("### Dependencies").unwrap();
        let older = output.find("## [1.0.0]").unwrap();
        assert!(deps < older);
        assert!(output.ends_with(&format!("{}\n", entry("1.0.0"))));
        assert_eq!(updater.update_content(Some(&output)).unwrap(), output);
    }

    #[test]
    fn test_dependency_notes_need_content() {
        let updater = DependencyNotesUpdater::new(Version::new(1, 0, 1), DEPS);
        assert!(updater.update_content(None).is_err());
    }
}
