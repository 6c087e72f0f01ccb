//! Cargo crates
//!
//! A path holding a workspace root manifest releases every member crate
//! with a literal version as its own artifact. Members inheriting the
//! workspace version follow the path version.

use std::sync::Arc;

use liftoff_core::{Result, Version, VersionsMap};
use liftoff_git::Hosting;
use liftoff_updaters::{CargoLock, CargoManifest, CargoToml};
use tracing::{debug, warn};

use super::{add_path, Artifact, BaseStrategy, Strategy};
use crate::candidate::Update;

pub(crate) const MANIFEST_FILE: &str = "Cargo.toml";

/// Crate name from `Cargo.toml`
pub(crate) fn package_name(content: &str) -> Option<String> {
    CargoManifest::parse(content)
        .ok()?
        .package_name()
        .map(str::to_string)
}

/// Member crates of a workspace root manifest that carry their own version
pub(crate) async fn workspace_artifacts(
    hosting: &dyn Hosting,
    path: &str,
    branch: &str,
    content: &str,
) -> Result<Vec<Artifact>> {
    let members = match CargoManifest::parse(content) {
        Ok(manifest) => manifest.workspace.map(|w| w.members).unwrap_or_default(),
        Err(e) => {
            warn!(path = %path, error = %e, "unreadable workspace manifest");
            return Ok(Vec::new());
        }
    };

    let mut artifacts = Vec::new();
    for member in members {
        if member.contains('*') {
            warn!(member = %member, "glob workspace members are not expanded");
            continue;
        }
        let member_path = add_path(path, &member);
        let file = add_path(&member_path, MANIFEST_FILE);
        let content = match hosting.file_contents_on_branch(&file, branch).await {
            Ok(contents) => contents.content,
            Err(e) if e.is_file_not_found() => {
                warn!(path = %file, "workspace member manifest not found");
                continue;
            }
            Err(e) => return Err(e),
        };
        let manifest = match CargoManifest::parse(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = %file, error = %e, "skipping unreadable member manifest");
                continue;
            }
        };
        let (Some(name), Some(raw)) = (manifest.package_name(), manifest.package_version()) else {
            debug!(path = %file, "member version follows the workspace");
            continue;
        };
        match Version::parse(raw) {
            Ok(version) => artifacts.push(Artifact {
                name: name.to_string(),
                path: member_path,
                version,
            }),
            Err(e) => warn!(path = %file, error = %e, "skipping member with invalid version"),
        }
    }
    Ok(artifacts)
}

/// Releases a Cargo crate
pub struct RustStrategy {
    base: BaseStrategy,
}

impl RustStrategy {
    /// Create the strategy
    pub fn new(base: BaseStrategy) -> Self {
        Self { base }
    }
}

impl Strategy for RustStrategy {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn base(&self) -> &BaseStrategy {
        &self.base
    }

    fn build_updates(&self, version: &Version, versions_map: &VersionsMap) -> Vec<Update> {
        let mut root = CargoToml::new(version.clone());
        if !self.base.artifacts.is_empty() {
            root = root.with_dependency_updates(versions_map.clone());
        }
        let mut updates = vec![Update::new(self.base.add_path(MANIFEST_FILE), Arc::new(root))];

        for artifact in &self.base.artifacts {
            let Some(next) = versions_map.get(&artifact.name) else {
                continue;
            };
            updates.push(Update::new(
                add_path(&artifact.path, MANIFEST_FILE),
                Arc::new(CargoToml::new(next.clone()).with_dependency_updates(versions_map.clone())),
            ));
        }

        updates.push(Update::new(
            self.base.add_path("Cargo.lock"),
            Arc::new(CargoLock::new(versions_map.clone())),
        ));
        updates
    }
}
