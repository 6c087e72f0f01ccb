//! Versioning for packages that mostly track their dependencies

use std::collections::BTreeMap;
use std::sync::LazyLock;

use liftoff_changelog::ClassifiedCommit;
use liftoff_core::{Result, Version};
use regex::Regex;
use tracing::debug;

use crate::default::DefaultVersioning;
use crate::traits::VersioningStrategy;
use crate::types::VersionBump;

/// `update dependency <name> to v<version>` with an optional `(#123)` suffix
static DEPENDENCY_UPDATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^update dependency (?P<dependency>\S+) to v?(?P<version>\d+(?:\.\d+){0,2}\S*?)(?:\s+\(#\d+\))?$",
    )
    .expect("Invalid regex")
});

/// Default versioning raised to the largest dependency update.
///
/// Commits typed or scoped `deps` that read
/// `update dependency foo to v2.0.0` contribute the bump level of the new
/// dependency version: `X.0.0` (or a bare `vX`) counts as major, `X.Y.0`
/// as minor, anything else as patch.
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    base: DefaultVersioning,
}

impl DependencyManifest {
    /// Wrap the default strategy with the given pre-major flags
    pub fn new(base: DefaultVersioning) -> Self {
        Self { base }
    }

    /// Newest requested version per dependency
    fn dependency_updates(commits: &[ClassifiedCommit]) -> BTreeMap<String, String> {
        let mut updates = BTreeMap::new();
        for commit in commits {
            let is_deps = commit.commit_type == "deps" || commit.scope.as_deref() == Some("deps");
            if !is_deps {
                continue;
            }
            if let Some(caps) = DEPENDENCY_UPDATE_REGEX.captures(&commit.bare_message) {
                // commits are newest first, keep the first match
                updates
                    .entry(caps["dependency"].to_string())
                    .or_insert_with(|| caps["version"].to_string());
            }
        }
        updates
    }

    fn dependency_bump(version: &str) -> VersionBump {
        let parts: Vec<&str> = version
            .split(['-', '+'])
            .next()
            .unwrap_or_default()
            .split('.')
            .collect();
        let is_zero = |i: usize| parts.get(i).map_or(true, |p| p.parse::<u64>() == Ok(0));

        if is_zero(1) && is_zero(2) {
            VersionBump::Major
        } else if is_zero(2) {
            VersionBump::Minor
        } else {
            VersionBump::Patch
        }
    }
}

impl VersioningStrategy for DependencyManifest {
    fn name(&self) -> &'static str {
        "dependency-manifest"
    }

    fn determine_release_type(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<VersionBump> {
        let mut bump = DefaultVersioning::classify(commits);
        for (dependency, version) in Self::dependency_updates(commits) {
            let dependency_bump = Self::dependency_bump(&version);
            debug!(%dependency, %version, bump = %dependency_bump, "dependency update");
            bump = bump.max(dependency_bump);
        }
        Ok(self.base.demote(current, bump))
    }
}
