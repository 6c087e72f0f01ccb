//! npm lock files

use liftoff_core::{Result, UpdaterError, Version, VersionsMap};
use serde_json::Value;
use tracing::debug;

use crate::json;
use crate::traits::Updater;

const FILE: &str = "package-lock.json";

/// Updates `package-lock.json` or `npm-shrinkwrap.json`.
///
/// The root version is set when one is given; workspace packages recorded
/// under `packages` are updated when their name appears in the versions map.
#[derive(Debug, Clone)]
pub struct PackageLockJson {
    version: Option<Version>,
    versions_map: VersionsMap,
}

impl PackageLockJson {
    /// Create an updater setting the root version
    pub fn new(version: Version) -> Self {
        Self {
            version: Some(version),
            versions_map: VersionsMap::new(),
        }
    }

    /// Create an updater that only touches workspace package entries
    pub fn for_workspace(versions_map: VersionsMap) -> Self {
        Self {
            version: None,
            versions_map,
        }
    }

    /// Also update these workspace packages
    pub fn with_versions_map(mut self, versions_map: VersionsMap) -> Self {
        self.versions_map = versions_map;
        self
    }
}

impl Updater for PackageLockJson {
    fn name(&self) -> &'static str {
        "package-lock-json"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content.ok_or_else(|| UpdaterError::MissingContent(FILE.to_string()))?;
        let mut doc = json::parse(FILE, content)?;
        let version = self.version.as_ref().map(|v| Value::String(v.to_string()));

        if let (Some(root), Some(version)) = (doc.as_object_mut(), &version) {
            root.insert("version".to_string(), version.clone());
        }

        if let Some(packages) = doc.get_mut("packages").and_then(Value::as_object_mut) {
            for (key, package) in packages.iter_mut() {
                let Some(package) = package.as_object_mut() else {
                    continue;
                };
                let new_version = if key.is_empty() {
                    version.clone()
                } else {
                    package
                        .get("name")
                        .and_then(Value::as_str)
                        .and_then(|name| self.versions_map.get(name))
                        .map(|v| Value::String(v.to_string()))
                };
                if let Some(new_version) = new_version {
                    debug!(entry = %key, version = %new_version, "updating lock entry");
                    package.insert("version".to_string(), new_version);
                }
            }
        }

        json::to_string(&doc, &json::detect_indent(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCK: &str = r#"{
  "name": "root",
  "version": "1.0.0",
  "lockfileVersion": 3,
  "packages": {
    "": {
      "name": "root",
      "version": "1.0.0"
    },
    "packages/a": {
      "name": "pkg-a",
      "version": "0.1.0"
    },
    "node_modules/lodash": {
      "version": "4.17.21"
    }
  }
}
"#;

    #[test]
    fn test_updates_root_and_workspace_entries() {
        let mut map = VersionsMap::new();
        map.insert("pkg-a".to_string(), Version::new(0, 2, 0));

        let output = PackageLockJson::new(Version::new(1, 1, 0))
            .with_versions_map(map)
            .update_content(Some(LOCK))
            .unwrap();
        let doc: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(doc["version"], "1.1.0");
        assert_eq!(doc["packages"][""]["version"], "1.1.0");
        assert_eq!(doc["packages"]["packages/a"]["version"], "0.2.0");
        assert_eq!(doc["packages"]["node_modules/lodash"]["version"], "4.17.21");
    }

    #[test]
    fn test_workspace_only_keeps_root() {
        let mut map = VersionsMap::new();
        map.insert("pkg-a".to_string(), Version::new(0, 1, 1));

        let output = PackageLockJson::for_workspace(map)
            .update_content(Some(LOCK))
            .unwrap();
        let doc: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(doc["version"], "1.0.0");
        assert_eq!(doc["packages"][""]["version"], "1.0.0");
        assert_eq!(doc["packages"]["packages/a"]["version"], "0.1.1");
    }

    #[test]
    fn test_idempotent() {
        let updater = PackageLockJson::new(Version::new(1, 1, 0));
        let once = updater.update_content(Some(LOCK)).unwrap();
        assert_eq!(updater.update_content(Some(&once)).unwrap(), once);
    }
}
