//! Core types for Liftoff

use serde::{Deserialize, Serialize};

/// Path key that denotes the repository root in manifest configuration
pub const ROOT_PROJECT_PATH: &str = ".";

/// Ecosystem of a tracked path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// Plain `version.txt` plus configured extra files
    #[default]
    Simple,
    /// npm package (`package.json`, lock files)
    Node,
    /// Cargo crate (`Cargo.toml`, `Cargo.lock`)
    Rust,
    /// Java-family project with snapshot versions
    Java,
    /// Python project (`pyproject.toml`, `setup.cfg`)
    Python,
}

impl ReleaseType {
    /// Returns the string representation of the release type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Node => "node",
            Self::Rust => "rust",
            Self::Java => "java",
            Self::Python => "python",
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReleaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "node" | "npm" => Ok(Self::Node),
            "rust" | "cargo" => Ok(Self::Rust),
            "java" | "maven" => Ok(Self::Java),
            "python" => Ok(Self::Python),
            _ => Err(format!("Unknown release type: {}", s)),
        }
    }
}

/// Versioning strategy selected for a tracked path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersioningKind {
    /// Conventional-commit driven major/minor/patch
    #[default]
    Default,
    /// Always bump patch
    AlwaysBumpPatch,
    /// Always bump minor
    AlwaysBumpMinor,
    /// Always bump major
    AlwaysBumpMajor,
    /// `sp.N` service pack counter
    ServicePack,
    /// Numbered pre-release trains (`1.0.0-beta.1`)
    Prerelease,
    /// Bumps derived from dependency update commits
    DependencyManifest,
}

impl VersioningKind {
    /// Returns the configuration name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AlwaysBumpPatch => "always-bump-patch",
            Self::AlwaysBumpMinor => "always-bump-minor",
            Self::AlwaysBumpMajor => "always-bump-major",
            Self::ServicePack => "service-pack",
            Self::Prerelease => "prerelease",
            Self::DependencyManifest => "dependency-manifest",
        }
    }
}

impl std::fmt::Display for VersioningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_release_type_from_str() {
        assert_eq!(ReleaseType::from_str("node").unwrap(), ReleaseType::Node);
        assert_eq!(ReleaseType::from_str("CARGO").unwrap(), ReleaseType::Rust);
        assert_eq!(ReleaseType::from_str("maven").unwrap(), ReleaseType::Java);
        assert!(ReleaseType::from_str("cobol").is_err());
    }

    #[test]
    fn test_versioning_kind_serde() {
        let kind: VersioningKind = serde_json::from_str("\"always-bump-patch\"").unwrap();
        assert_eq!(kind, VersioningKind::AlwaysBumpPatch);
        assert_eq!(kind.to_string(), "always-bump-patch");
    }
}
