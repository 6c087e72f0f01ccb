//! Versioning strategy trait

use liftoff_changelog::ClassifiedCommit;
use liftoff_core::{Result, Version};
use tracing::{debug, warn};

use crate::types::VersionBump;

/// Trait for versioning strategies
pub trait VersioningStrategy: Send + Sync {
    /// Get the name of this strategy
    fn name(&self) -> &'static str;

    /// Classify the commits since `current` into a release type
    fn determine_release_type(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<VersionBump>;

    /// Apply a release type to `current`
    fn do_bump(&self, current: &Version, bump: &VersionBump) -> Result<Version> {
        Ok(apply_bump(current, bump))
    }

    /// Compute the next version.
    ///
    /// A `Release-As` footer on any commit wins over the strategy; with
    /// several, the newest commit (first in the list) is used.
    fn bump(&self, current: &Version, commits: &[ClassifiedCommit]) -> Result<Version> {
        if let Some(version) = release_as_override(commits) {
            debug!(strategy = self.name(), %version, "release-as override");
            return Ok(version);
        }

        let bump = self.determine_release_type(current, commits)?;
        let next = self.do_bump(current, &bump)?;
        debug!(strategy = self.name(), %current, %bump, %next, "bumped version");
        Ok(next)
    }
}

/// Apply a bump: the bumped component is incremented, lower components are
/// zeroed, build metadata is kept and the pre-release tag is dropped.
pub fn apply_bump(current: &Version, bump: &VersionBump) -> Version {
    let mut next = match bump {
        VersionBump::Major => Version::new(current.major + 1, 0, 0),
        VersionBump::Minor => Version::new(current.major, current.minor + 1, 0),
        VersionBump::Patch => Version::new(current.major, current.minor, current.patch + 1),
        VersionBump::Custom(version) => return version.clone(),
    };
    next.build = current.build.clone();
    next
}

/// Version forced by a `Release-As` footer; the newest commit wins.
///
/// Invalid versions are logged and ignored.
pub fn release_as_override(commits: &[ClassifiedCommit]) -> Option<Version> {
    commits.iter().find_map(|commit| {
        let raw = commit.release_as()?;
        match Version::parse(raw) {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(sha = %commit.short_sha(), error = %e, "ignoring invalid Release-As");
                None
            }
        }
    })
}

/// Whether any commit carries a breaking change
pub(crate) fn has_breaking(commits: &[ClassifiedCommit]) -> bool {
    commits.iter().any(|c| c.breaking)
}

/// Whether any commit is a feature
pub(crate) fn has_feature(commits: &[ClassifiedCommit]) -> bool {
    commits.iter().any(|c| c.is_feature())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_bump_zeroes_lower_components() {
        let current = Version::new(1, 2, 3).with_pre_release("beta.1").with_build("b5");

        let major = apply_bump(&current, &VersionBump::Major);
        assert_eq!(major.to_string(), "2.0.0+b5");

        let minor = apply_bump(&current, &VersionBump::Minor);
        assert_eq!(minor.to_string(), "1.3.0+b5");

        let patch = apply_bump(&current, &VersionBump::Patch);
        assert_eq!(patch.to_string(), "1.2.4+b5");
    }

    #[test]
    fn test_apply_custom() {
        let custom = Version::new(9, 9, 9);
        assert_eq!(
            apply_bump(&Version::new(1, 0, 0), &VersionBump::Custom(custom.clone())),
            custom
        );
    }
}
