//! Conventional commit versioning

use liftoff_changelog::ClassifiedCommit;
use liftoff_core::{Result, Version};

use crate::traits::{has_breaking, has_feature, VersioningStrategy};
use crate::types::VersionBump;

/// Default versioning: breaking changes bump major, features bump minor,
/// everything else bumps patch.
///
/// Below 1.0.0 the bump can be demoted with `bump_minor_pre_major` and
/// `bump_patch_for_minor_pre_major`.
#[derive(Debug, Clone, Default)]
pub struct DefaultVersioning {
    /// Demote major bumps to minor below 1.0.0
    pub bump_minor_pre_major: bool,
    /// Demote minor bumps to patch below 1.0.0
    pub bump_patch_for_minor_pre_major: bool,
}

impl DefaultVersioning {
    /// Create a new default strategy
    pub fn new() -> Self {
        Self::default()
    }

    /// Demote major bumps to minor below 1.0.0
    pub fn with_bump_minor_pre_major(mut self, enabled: bool) -> Self {
        self.bump_minor_pre_major = enabled;
        self
    }

    /// Demote minor bumps to patch below 1.0.0
    pub fn with_bump_patch_for_minor_pre_major(mut self, enabled: bool) -> Self {
        self.bump_patch_for_minor_pre_major = enabled;
        self
    }

    /// Classification before pre-major demotion
    pub(crate) fn classify(commits: &[ClassifiedCommit]) -> VersionBump {
        if has_breaking(commits) {
            VersionBump::Major
        } else if has_feature(commits) {
            VersionBump::Minor
        } else {
            VersionBump::Patch
        }
    }

    pub(crate) fn demote(&self, current: &Version, bump: VersionBump) -> VersionBump {
        bump.demote_pre_major(
            current,
            self.bump_minor_pre_major,
            self.bump_patch_for_minor_pre_major,
        )
    }
}

impl VersioningStrategy for DefaultVersioning {
    fn name(&self) -> &'static str {
        "default"
    }

    fn determine_release_type(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<VersionBump> {
        Ok(self.demote(current, Self::classify(commits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::commits;

    fn bump(strategy: &DefaultVersioning, current: &str, messages: &[&str]) -> String {
        strategy
            .bump(&Version::parse(current).unwrap(), &commits(messages))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_patch_for_fixes() {
        let strategy = DefaultVersioning::new();
        assert_eq!(bump(&strategy, "0.123.4", &["fix: bugfix"]), "0.123.5");
        assert_eq!(bump(&strategy, "1.2.3", &["docs: readme"]), "1.2.4");
    }

    #[test]
    fn test_minor_for_features() {
        let strategy = DefaultVersioning::new();
        assert_eq!(bump(&strategy, "1.2.3", &["fix: a", "feat: b"]), "1.3.0");
    }

    #[test]
    fn test_breaking_always_major() {
        let strategy = DefaultVersioning::new();
        for messages in [
            &["feat!: drop api"][..],
            &["fix: a", "chore(deps)!: drop node 14"][..],
            &["feat: x\n\nBREAKING CHANGE: gone"][..],
        ] {
            assert_eq!(bump(&strategy, "1.2.3", messages), "2.0.0");
        }
        // below 1.0.0 a breaking change still moves to 1.0.0 without demotion
        assert_eq!(bump(&strategy, "0.5.1", &["feat!: x"]), "1.0.0");
    }

    #[test]
    fn test_pre_major_demotion() {
        let strategy = DefaultVersioning::new()
            .with_bump_minor_pre_major(true)
            .with_bump_patch_for_minor_pre_major(true);
        assert_eq!(bump(&strategy, "0.5.1", &["feat!: x"]), "0.6.0");
        assert_eq!(bump(&strategy, "0.5.1", &["feat: x"]), "0.5.2");
        assert_eq!(bump(&strategy, "1.5.1", &["feat!: x"]), "2.0.0");
    }

    #[test]
    fn test_release_as_wins() {
        let strategy = DefaultVersioning::new();
        assert_eq!(
            bump(
                &strategy,
                "1.2.3",
                &["chore: x\n\nRelease-As: 3.0.0", "feat!: y\n\nRelease-As: 2.5.0"]
            ),
            "3.0.0"
        );
    }
}
