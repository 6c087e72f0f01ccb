//! Cargo.lock handling

use liftoff_core::{Result, UpdaterError, VersionsMap};
use toml_edit::{DocumentMut, Item};
use tracing::debug;

use super::set_string;
use crate::traits::Updater;

const FILE: &str = "Cargo.lock";

/// Updates the locked versions of workspace crates.
///
/// Only entries without a `source` are touched; those are the local
/// crates, registry and git packages keep their versions.
#[derive(Debug, Clone)]
pub struct CargoLock {
    versions_map: VersionsMap,
}

impl CargoLock {
    /// Create an updater for the given crate versions
    pub fn new(versions_map: VersionsMap) -> Self {
        Self { versions_map }
    }
}

impl Updater for CargoLock {
    fn name(&self) -> &'static str {
        "cargo-lock"
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

        let Some(packages) = doc
            .get_mut("package")
            .and_then(Item::as_array_of_tables_mut)
        else {
            return Ok(doc.to_string());
        };

        for package in packages.iter_mut() {
            if package.contains_key("source") {
                continue;
            }
            let Some(name) = package.get("name").and_then(Item::as_str) else {
                continue;
            };
            let Some(version) = self.versions_map.get(name) else {
                continue;
            };
            debug!(package = %name, %version, "updating locked version");
            let version = version.to_string();
            if let Some(item) = package.get_mut("version") {
                set_string(item, &version);
            }
        }

        Ok(doc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftoff_core::Version;

    const LOCK: &str = r#"# This file is automatically @generated by Cargo.
version = 3

[[package]]
name = "pkg-a"
version = "0.1.0"

[[package]]
name = "pkg-b"
version = "0.1.0"
dependencies = [
 "pkg-a",
]

[[package]]
name = "serde"
version = "1.0.0"
source = "registry+https://github.com/rust-lang/crates.io-index"
"#;

    #[test]
    fn test_updates_local_crates_only() {
        let mut map = VersionsMap::new();
        map.insert("pkg-a".to_string(), Version::new(0, 2, 0));
        map.insert("serde".to_string(), Version::new(9, 9, 9));

        let updated = CargoLock::new(map).update_content(Some(LOCK)).unwrap();
        assert!(updated.contains("name = \"pkg-a\"\nversion = \"0.2.0\""));
        assert!(updated.contains("name = \"pkg-b\"\nversion = \"0.1.0\""));
        assert!(updated.contains("name = \"serde\"\nversion = \"1.0.0\""));
        assert!(updated.starts_with("# This file is automatically @generated by Cargo."));
    }
}
