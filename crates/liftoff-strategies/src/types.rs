//! Versioning strategy types

use std::fmt;

use liftoff_core::Version;
use serde::{Deserialize, Serialize};

/// Release type chosen by a versioning strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    /// Major version bump (breaking changes)
    Major,
    /// Minor version bump (new features)
    Minor,
    /// Patch version bump (bug fixes)
    Patch,
    /// An exact version computed by the strategy
    Custom(Version),
}

impl VersionBump {
    fn rank(&self) -> u8 {
        match self {
            Self::Patch => 0,
            Self::Minor => 1,
            Self::Major => 2,
            Self::Custom(_) => 3,
        }
    }

    /// Get the higher priority bump
    pub fn max(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    /// Demote the bump for versions below 1.0.0
    pub fn demote_pre_major(
        self,
        current: &Version,
        bump_minor_pre_major: bool,
        bump_patch_for_minor_pre_major: bool,
    ) -> Self {
        if !current.is_pre_major() {
            return self;
        }
        match self {
            Self::Major if bump_minor_pre_major => Self::Minor,
            Self::Minor if bump_patch_for_minor_pre_major => Self::Patch,
            other => other,
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::Custom(version) => write!(f, "custom ({})", version),
        }
    }
}
