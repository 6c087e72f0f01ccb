//! Cargo.toml handling

use std::collections::BTreeMap;

use liftoff_core::{Result, UpdaterError, Version, VersionsMap};
use serde::Deserialize;
use toml_edit::{DocumentMut, Item, TableLike};
use tracing::debug;

use super::set_string;
use crate::traits::{bump_requirement, Updater};

const FILE: &str = "Cargo.toml";

/// Dependency tables that may reference workspace crates
const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Cargo.toml structure (for reading)
#[derive(Debug, Clone, Deserialize)]
pub struct CargoManifest {
    /// Package section
    pub package: Option<Package>,
    /// Workspace section
    pub workspace: Option<Workspace>,
    /// Dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, toml::Value>,
    /// Dev dependencies
    #[serde(default, rename = "dev-dependencies")]
    pub dev_dependencies: BTreeMap<String, toml::Value>,
    /// Build dependencies
    #[serde(default, rename = "build-dependencies")]
    pub build_dependencies: BTreeMap<String, toml::Value>,
}

/// Package section
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    /// Package name
    pub name: String,
    /// Package version, either a string or `{ workspace = true }`
    pub version: Option<toml::Value>,
    /// Whether to publish
    pub publish: Option<toml::Value>,
}

/// Workspace section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workspace {
    /// Workspace members
    #[serde(default)]
    pub members: Vec<String>,
}

impl CargoManifest {
    /// Parse Cargo.toml content
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            UpdaterError::Parse {
                file: FILE.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Package name, when the manifest has a `[package]`
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    /// Literal package version (inherited versions yield `None`)
    pub fn package_version(&self) -> Option<&str> {
        self.package.as_ref()?.version.as_ref()?.as_str()
    }

    /// Names of the crates this manifest depends on through a `path`.
    ///
    /// Renamed dependencies report the real crate name.
    pub fn path_dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = [
            &self.dependencies,
            &self.dev_dependencies,
            &self.build_dependencies,
        ]
        .into_iter()
        .flat_map(|deps| deps.iter())
        .filter_map(|(key, value)| {
            let table = value.as_table()?;
            table.get("path")?;
            let name = table
                .get("package")
                .and_then(toml::Value::as_str)
                .unwrap_or(key);
            Some(name.to_string())
        })
        .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Updates a Cargo.toml, preserving formatting
#[derive(Debug, Clone)]
pub struct CargoToml {
    version: Option<Version>,
    dependency_updates: VersionsMap,
}

impl CargoToml {
    /// Create an updater setting the package version
    pub fn new(version: Version) -> Self {
        Self {
            version: Some(version),
            dependency_updates: VersionsMap::new(),
        }
    }

    /// Create an updater that only rewrites dependency requirements
    pub fn dependencies_only(updates: VersionsMap) -> Self {
        Self {
            version: None,
            dependency_updates: updates,
        }
    }

    /// Also rewrite path dependencies on these crates
    pub fn with_dependency_updates(mut self, updates: VersionsMap) -> Self {
        self.dependency_updates = updates;
        self
    }

    fn update_dependencies(&self, table: &mut dyn TableLike) {
        for (key, item) in table.iter_mut() {
            let Some(dependency) = item.as_table_like_mut() else {
                // plain `name = "1.0"` requirements point at the registry
                continue;
            };
            if dependency.get("path").is_none() {
                continue;
            }
            let name = dependency
                .get("package")
                .and_then(Item::as_str)
                .unwrap_or(key.get())
                .to_string();
            let Some(version) = self.dependency_updates.get(&name) else {
                continue;
            };
            if let Some(requirement) = dependency.get_mut("version") {
                if let Some(current) = requirement.as_str().map(str::to_string) {
                    let updated = bump_requirement(&current, version);
                    debug!(dependency = %name, from = %current, to = %updated, "updating dependency");
                    set_string(requirement, &updated);
                }
            }
        }
    }

    fn update_dependency_tables(&self, table: &mut dyn TableLike) {
        for name in DEPENDENCY_TABLES {
            if let Some(deps) = table.get_mut(name).and_then(Item::as_table_like_mut) {
                self.update_dependencies(deps);
            }
        }
    }
}

impl Updater for CargoToml {
    fn name(&self) -> &'static str {
        "cargo-toml"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content.ok_or_else(|| UpdaterError::MissingContent(FILE.to_string()))?;
        let mut doc: DocumentMut =
            content
                .parse()
                .map_err(|e: toml_edit::TomlError| UpdaterError::Parse {
                    file: FILE.to_string(),
                    message: e.to_string(),
                })?;

        let has_package = doc.get("package").is_some();
        if !has_package && doc.get("workspace").is_none() {
            return Err(UpdaterError::MissingField {
                file: FILE.to_string(),
                field: "package".to_string(),
            }
            .into());
        }

        let version_item = if has_package {
            doc.get_mut("package")
                .and_then(Item::as_table_like_mut)
                .and_then(|package| package.get_mut("version"))
        } else {
            doc.get_mut("workspace")
                .and_then(Item::as_table_like_mut)
                .and_then(|workspace| workspace.get_mut("package"))
                .and_then(Item::as_table_like_mut)
                .and_then(|package| package.get_mut("version"))
        };
        match (version_item, &self.version) {
            (_, None) => {}
            (Some(item), Some(version)) if item.is_str() => set_string(item, &version.to_string()),
            (Some(_), Some(_)) => debug!("package version is inherited from the workspace"),
            (None, Some(_)) => debug!("manifest has no version field"),
        }

        if !self.dependency_updates.is_empty() {
            self.update_dependency_tables(doc.as_table_mut());

            if let Some(targets) = doc.get_mut("target").and_then(Item::as_table_like_mut) {
                for (_, target) in targets.iter_mut() {
                    if let Some(target) = target.as_table_like_mut() {
                        self.update_dependency_tables(target);
                    }
                }
            }

            if let Some(deps) = doc
                .get_mut("workspace")
                .and_then(Item::as_table_like_mut)
                .and_then(|workspace| workspace.get_mut("dependencies"))
                .and_then(Item::as_table_like_mut)
            {
                self.update_dependencies(deps);
            }
        }

        Ok(doc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let cargo = CargoManifest::parse(
            r#"
[package]
name = "test-crate"
version = "1.0.0"

[dependencies]
serde = "1.0"
core = { path = "../core", version = "0.2.0", package = "my-core" }

[dev-dependencies]
helpers = { path = "../helpers" }
"#,
        )
        .unwrap();

        assert_eq!(cargo.package_name(), Some("test-crate"));
        assert_eq!(cargo.package_version(), Some("1.0.0"));
        assert_eq!(cargo.path_dependencies(), vec!["helpers", "my-core"]);
    }

    #[test]
    fn test_workspace_detection() {
        let cargo = CargoManifest::parse("[workspace]\nmembers = [\"crates/*\"]\n").unwrap();
        assert!(cargo.package.is_none());
        assert_eq!(cargo.workspace.unwrap().members, vec!["crates/*"]);
    }

    #[test]
    fn test_inherited_version() {
        let cargo =
            CargoManifest::parse("[package]\nname = \"a\"\nversion.workspace = true\n").unwrap();
        assert_eq!(cargo.package_version(), None);
    }

    #[test]
    fn test_update_version_preserves_formatting() {
        let original = r#"[package]
name = "test-crate"
version = "1.0.0" # keep me
edition = "2021"

# This is a comment

[dependencies]
serde = "1.0"
"#;
        let updated = CargoToml::new(Version::new(2, 0, 0))
            .update_content(Some(original))
            .unwrap();

        assert!(updated.contains("version = \"2.0.0\" # keep me"));
        assert!(updated.contains("# This is a comment"));
        assert!(updated.contains("serde = \"1.0\""));
    }

    #[test]
    fn test_update_path_dependencies() {
        let original = r#"[package]
name = "pkg-b"
version = "0.1.0"

[dependencies]
pkg-a = { path = "../a", version = "^0.1.0" }
pkg-c = "0.1.0"

[target.'cfg(unix)'.dependencies]
pkg-a = { path = "../a", version = "0.1.0" }

[dev-dependencies.pkg-a]
path = "../a"
version = "~0.1.0"
"#;
        let mut updates = VersionsMap::new();
        updates.insert("pkg-a".to_string(), Version::new(0, 2, 0));
        updates.insert("pkg-c".to_string(), Version::new(0, 2, 0));

        let updated = CargoToml::new(Version::new(0, 1, 1))
            .with_dependency_updates(updates)
            .update_content(Some(original))
            .unwrap();

        assert!(updated.contains("version = \"0.1.1\""));
        assert!(updated.contains("pkg-a = { path = \"../a\", version = \"^0.2.0\" }"));
        assert!(updated.contains("pkg-a = { path = \"../a\", version = \"0.2.0\" }"));
        assert!(updated.contains("version = \"~0.2.0\""));
        // registry dependency is left alone
        assert!(updated.contains("pkg-c = \"0.1.0\""));
    }

    #[test]
    fn test_workspace_dependencies_only() {
        let original = r#"[workspace]
members = ["crates/*"]

[workspace.package]
version = "0.1.0"

[workspace.dependencies]
pkg-a = { path = "crates/a", version = "0.1.0" }
"#;
        let mut updates = VersionsMap::new();
        updates.insert("pkg-a".to_string(), Version::new(0, 1, 1));

        let updated = CargoToml::dependencies_only(updates)
            .update_content(Some(original))
            .unwrap();
        assert!(updated.contains("[workspace.package]\nversion = \"0.1.0\""));
        assert!(updated.contains("pkg-a = { path = \"crates/a\", version = \"0.1.1\" }"));
    }

    #[test]
    fn test_missing_package_section() {
        let result = CargoToml::new(Version::new(1, 0, 0)).update_content(Some("[lib]\n"));
        assert!(result.is_err());
    }
}
