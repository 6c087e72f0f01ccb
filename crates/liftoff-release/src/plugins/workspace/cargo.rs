//! Cargo workspaces

use std::sync::Arc;

use liftoff_core::{ReleaseType, Result, UpdaterError, Version, VersionsMap};
use liftoff_updaters::{CargoLock, CargoManifest, CargoToml, Updater};

use super::{WorkspaceDependency, WorkspaceEcosystem, WorkspacePackage};
use crate::candidate::Update;

/// Cargo workspace crates, linked through `path` or `workspace` dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoWorkspace;

impl WorkspaceEcosystem for CargoWorkspace {
    fn plugin_name(&self) -> &'static str {
        "cargo-workspace"
    }

    fn release_type(&self) -> ReleaseType {
        ReleaseType::Rust
    }

    fn manifest_file(&self) -> &'static str {
        "Cargo.toml"
    }

    fn parse_package(&self, path: &str, content: &str) -> Result<WorkspacePackage> {
        let manifest = CargoManifest::parse(content)?;
        let name = manifest
            .package_name()
            .ok_or_else(|| UpdaterError::MissingField {
                file: "Cargo.toml".to_string(),
                field: "package.name".to_string(),
            })?
            .to_string();

        let sections = [
            ("dependencies", &manifest.dependencies),
            ("dev-dependencies", &manifest.dev_dependencies),
            ("build-dependencies", &manifest.build_dependencies),
        ];
        let mut dependencies = Vec::new();
        for (section, deps) in sections {
            for (key, value) in deps {
                // registry dependencies cannot point into the workspace
                let Some(table) = value.as_table() else {
                    continue;
                };
                if !table.contains_key("path") && !table.contains_key("workspace") {
                    continue;
                }
                dependencies.push(WorkspaceDependency {
                    section: section.to_string(),
                    name: table
                        .get("package")
                        .and_then(toml::Value::as_str)
                        .unwrap_or(key)
                        .to_string(),
                    requirement: table
                        .get("version")
                        .and_then(toml::Value::as_str)
                        .map(str::to_string),
                });
            }
        }

        Ok(WorkspacePackage {
            version: manifest
                .package_version()
                .and_then(|v| Version::parse(v).ok()),
            name,
            path: path.to_string(),
            dependencies,
        })
    }

    fn manifest_updater(
        &self,
        version: &Version,
        dependency_updates: VersionsMap,
    ) -> Arc<dyn Updater> {
        Arc::new(CargoToml::new(version.clone()).with_dependency_updates(dependency_updates))
    }

    fn root_updates(&self, versions: &VersionsMap) -> Vec<Update> {
        vec![
            Update::new("Cargo.toml", Arc::new(CargoToml::dependencies_only(versions.clone()))),
            Update::new("Cargo.lock", Arc::new(CargoLock::new(versions.clone()))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package() {
        let package = CargoWorkspace
            .parse_package(
                "crates/b",
                r#"[package]
name = "pkg-b"
version = "0.3.0"

[dependencies]
serde = "1"
pkg-a = { path = "../a", version = "0.2.0" }
core = { workspace = true, package = "pkg-core" }

[dev-dependencies]
pkg-test = { path = "../test" }
"#,
            )
            .unwrap();

        assert_eq!(package.name, "pkg-b");
        assert_eq!(package.version, Some(Version::new(0, 3, 0)));
        assert_eq!(
            package.dependencies,
            vec![
                WorkspaceDependency {
                    section: "dependencies".to_string(),
                    name: "pkg-core".to_string(),
                    requirement: None,
                },
                WorkspaceDependency {
                    section: "dependencies".to_string(),
                    name: "pkg-a".to_string(),
                    requirement: Some("0.2.0".to_string()),
                },
                WorkspaceDependency {
                    section: "dev-dependencies".to_string(),
                    name: "pkg-test".to_string(),
                    requirement: None,
                },
            ]
        );
    }

    #[test]
    fn test_virtual_manifest_is_rejected() {
        assert!(CargoWorkspace
            .parse_package(".", "[workspace]\nmembers = [\"crates/*\"]\n")
            .is_err());
    }
}
