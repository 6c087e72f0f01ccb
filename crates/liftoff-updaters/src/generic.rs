//! Marker comment updater for arbitrary text files
//!
//! A line carrying `x-liftoff-version` has its first version replaced; the
//! `x-liftoff-major`, `x-liftoff-minor` and `x-liftoff-patch` markers
//! replace the first number on the line with that component. Blocks
//! between `x-liftoff-start-<scope>` and `x-liftoff-end` are treated as if
//! every line carried the marker.

use std::sync::LazyLock;

use liftoff_core::{Result, UpdaterError, Version};
use regex::{NoExpand, Regex};
use tracing::debug;

use crate::traits::Updater;

static INLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"x-liftoff-(?P<scope>version|major|minor|patch)\b").expect("Invalid regex")
});

static BLOCK_START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"x-liftoff-start-(?P<scope>version|major|minor|patch)\b").expect("Invalid regex")
});

static BLOCK_END_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"x-liftoff-end\b").expect("Invalid regex"));

static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?").expect("Invalid regex")
});

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("Invalid regex"));

/// Replaces versions next to marker comments
#[derive(Debug, Clone)]
pub struct Generic {
    version: Version,
}

impl Generic {
    /// Create an updater writing `version`
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    fn replace(&self, line: &str, scope: &str) -> String {
        let (regex, replacement) = match scope {
            "major" => (&*NUMBER_REGEX, self.version.major.to_string()),
            "minor" => (&*NUMBER_REGEX, self.version.minor.to_string()),
            "patch" => (&*NUMBER_REGEX, self.version.patch.to_string()),
            _ => (&*VERSION_REGEX, self.version.to_string()),
        };
        regex
            .replacen(line, 1, NoExpand(&replacement))
            .into_owned()
    }
}

impl Updater for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent("generic file".to_string()))?;

        let mut block: Option<String> = None;
        let mut replaced = 0usize;
        let lines: Vec<String> = content
            .split('\n')
            .map(|line| {
                if let Some(caps) = BLOCK_START_REGEX.captures(line) {
                    block = Some(caps["scope"].to_string());
                    return line.to_string();
                }
                if BLOCK_END_REGEX.is_match(line) {
                    block = None;
                    return line.to_string();
                }
                let scope = INLINE_REGEX
                    .captures(line)
                    .map(|caps| caps["scope"].to_string())
                    .or_else(|| block.clone());
                match scope {
                    Some(scope) => {
                        replaced += 1;
                        self.replace(line, &scope)
                    }
                    None => line.to_string(),
                }
            })
            .collect();

        debug!(version = %self.version, lines = replaced, "updated marked lines");
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(content: &str) -> String {
        Generic::new(Version::new(2, 3, 4))
            .update_content(Some(content))
            .unwrap()
    }

    #[test]
    fn test_inline_markers() {
        let content = "const VERSION = '1.0.0'; // x-liftoff-version\nconst OTHER = '1.0.0';\n";
        assert_eq!(
            update(content),
            "const VERSION = '2.3.4'; // x-liftoff-version\nconst OTHER = '1.0.0';\n"
        );
    }

    #[test]
    fn test_component_markers() {
        let content = "MAJOR = 1 # x-liftoff-major\nMINOR = 0 # x-liftoff-minor\nPATCH = 9 # x-liftoff-patch\n";
        assert_eq!(
            update(content),
            "MAJOR = 2 # x-liftoff-major\nMINOR = 3 # x-liftoff-minor\nPATCH = 4 # x-liftoff-patch\n"
        );
    }

    #[test]
    fn test_block_markers() {
        let content = "<!-- x-liftoff-start-version -->\ninstall foo@1.0.0\nthen bar 1.0.0-beta.1\n<!-- x-liftoff-end -->\nkeep 1.0.0\n";
        assert_eq!(
            update(content),
            "<!-- x-liftoff-start-version -->\ninstall foo@2.3.4\nthen bar 2.3.4\n<!-- x-liftoff-end -->\nkeep 1.0.0\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let once = update("v = \"0.1.0\" # x-liftoff-version\n");
        assert_eq!(update(&once), once);
    }
}
