//! Fixed-level versioning

use liftoff_changelog::ClassifiedCommit;
use liftoff_core::{Result, Version};

use crate::traits::VersioningStrategy;
use crate::types::VersionBump;

macro_rules! always_bump {
    ($(#[$meta:meta])* $name:ident, $label:literal, $bump:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl VersioningStrategy for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn determine_release_type(
                &self,
                _current: &Version,
                _commits: &[ClassifiedCommit],
            ) -> Result<VersionBump> {
                Ok($bump)
            }
        }
    };
}

always_bump!(
    /// Bumps patch regardless of commits
    AlwaysBumpPatch,
    "always-bump-patch",
    VersionBump::Patch
);
always_bump!(
    /// Bumps minor regardless of commits
    AlwaysBumpMinor,
    "always-bump-minor",
    VersionBump::Minor
);
always_bump!(
    /// Bumps major regardless of commits
    AlwaysBumpMajor,
    "always-bump-major",
    VersionBump::Major
);
