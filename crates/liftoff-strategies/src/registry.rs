//! Strategy selection

use std::sync::Arc;

use liftoff_core::config::ReleaserConfig;
use liftoff_core::{ReleaseType, VersioningKind};
use tracing::debug;

use crate::always::{AlwaysBumpMajor, AlwaysBumpMinor, AlwaysBumpPatch};
use crate::default::DefaultVersioning;
use crate::dependency_manifest::DependencyManifest;
use crate::prerelease::PrereleaseVersioning;
use crate::service_pack::ServicePack;
use crate::snapshot::JavaSnapshot;
use crate::traits::VersioningStrategy;

/// Build the versioning strategy configured for a path.
///
/// Java paths wrap the configured strategy with snapshot handling.
pub fn strategy_for(config: &ReleaserConfig) -> Arc<dyn VersioningStrategy> {
    let base = DefaultVersioning::new()
        .with_bump_minor_pre_major(config.bump_minor_pre_major.unwrap_or(false))
        .with_bump_patch_for_minor_pre_major(config.bump_patch_for_minor_pre_major.unwrap_or(false));

    let strategy: Arc<dyn VersioningStrategy> = match config.versioning() {
        VersioningKind::Default => Arc::new(base),
        VersioningKind::AlwaysBumpPatch => Arc::new(AlwaysBumpPatch),
        VersioningKind::AlwaysBumpMinor => Arc::new(AlwaysBumpMinor),
        VersioningKind::AlwaysBumpMajor => Arc::new(AlwaysBumpMajor),
        VersioningKind::ServicePack => Arc::new(ServicePack),
        VersioningKind::DependencyManifest => Arc::new(DependencyManifest::new(base)),
        VersioningKind::Prerelease => {
            let mut prerelease = PrereleaseVersioning::new(base);
            if let Some(prerelease_type) = &config.prerelease_type {
                prerelease = prerelease.with_prerelease_type(prerelease_type);
            }
            Arc::new(prerelease)
        }
    };

    let strategy: Arc<dyn VersioningStrategy> = if config.release_type() == ReleaseType::Java {
        Arc::new(JavaSnapshot::new(strategy))
    } else {
        strategy
    };

    debug!(
        versioning = config.versioning().as_str(),
        strategy = strategy.name(),
        "selected versioning strategy"
    );
    strategy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy() {
        let strategy = strategy_for(&ReleaserConfig::default());
        assert_eq!(strategy.name(), "default");
    }

    #[test]
    fn test_configured_strategies() {
        let cases = [
            (VersioningKind::AlwaysBumpPatch, "always-bump-patch"),
            (VersioningKind::AlwaysBumpMinor, "always-bump-minor"),
            (VersioningKind::AlwaysBumpMajor, "always-bump-major"),
            (VersioningKind::ServicePack, "service-pack"),
            (VersioningKind::DependencyManifest, "dependency-manifest"),
            (VersioningKind::Prerelease, "prerelease"),
        ];
        for (kind, name) in cases {
            let config = ReleaserConfig {
                versioning: Some(kind),
                ..Default::default()
            };
            assert_eq!(strategy_for(&config).name(), name);
        }
    }

    #[test]
    fn test_java_is_wrapped() {
        let config = ReleaserConfig {
            release_type: Some(ReleaseType::Java),
            ..Default::default()
        };
        assert_eq!(strategy_for(&config).name(), "java-snapshot");
    }
}
