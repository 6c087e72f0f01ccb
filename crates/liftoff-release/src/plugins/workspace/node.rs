//! npm workspaces

use std::sync::Arc;

use liftoff_core::{ReleaseType, Result, Version, VersionsMap};
use liftoff_updaters::{PackageJson, PackageJsonManifest, PackageLockJson, Updater};

use super::{WorkspaceDependency, WorkspaceEcosystem, WorkspacePackage};
use crate::candidate::Update;

/// npm workspace packages, linked through `package.json` dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeWorkspace;

impl WorkspaceEcosystem for NodeWorkspace {
    fn plugin_name(&self) -> &'static str {
        "node-workspace"
    }

    fn release_type(&self) -> ReleaseType {
        ReleaseType::Node
    }

    fn manifest_file(&self) -> &'static str {
        "package.json"
    }

    fn parse_package(&self, path: &str, content: &str) -> Result<WorkspacePackage> {
        let manifest = PackageJsonManifest::parse(content)?;
        let dependencies = manifest
            .dependency_sections()
            .into_iter()
            .flat_map(|(section, deps)| {
                deps.iter().map(move |(name, requirement)| WorkspaceDependency {
                    section: section.to_string(),
                    name: name.clone(),
                    requirement: Some(requirement.clone()),
                })
            })
            .collect();

        Ok(WorkspacePackage {
            version: manifest
                .version
                .as_deref()
                .and_then(|v| Version::parse(v).ok()),
            name: manifest.name,
            path: path.to_string(),
            dependencies,
        })
    }

    fn manifest_updater(
        &self,
        version: &Version,
        dependency_updates: VersionsMap,
    ) -> Arc<dyn Updater> {
        Arc::new(PackageJson::new(version.clone()).with_dependency_updates(dependency_updates))
    }

    fn root_updates(&self, versions: &VersionsMap) -> Vec<Update> {
        vec![Update::new(
            "package-lock.json",
            Arc::new(PackageLockJson::for_workspace(versions.clone())),
        )]
    }
}
