//! npm package.json handling

use std::collections::BTreeMap;

use liftoff_core::{Result, UpdaterError, Version, VersionsMap};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::json;
use crate::traits::{bump_requirement, Updater};

const FILE: &str = "package.json";

/// Dependency sections that may reference workspace packages
pub const DEPENDENCY_FIELDS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// package.json structure (for reading)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJsonManifest {
    /// Package name
    pub name: String,

    /// Package version
    #[serde(default)]
    pub version: Option<String>,

    /// Whether package is private
    #[serde(default)]
    pub private: bool,

    /// Dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Dev dependencies
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Peer dependencies
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,

    /// Optional dependencies
    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl PackageJsonManifest {
    /// Parse package.json content
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            UpdaterError::Parse {
                file: FILE.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Dependency sections keyed by their package.json field name
    pub fn dependency_sections(&self) -> [(&'static str, &BTreeMap<String, String>); 4] {
        [
            ("dependencies", &self.dependencies),
            ("devDependencies", &self.dev_dependencies),
            ("peerDependencies", &self.peer_dependencies),
            ("optionalDependencies", &self.optional_dependencies),
        ]
    }

    /// Names of every dependency, across all sections
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependency_sections()
            .into_iter()
            .flat_map(|(_, deps)| deps.keys().map(String::as_str))
    }
}

/// Updates the version of a package.json and its workspace dependencies
#[derive(Debug, Clone)]
pub struct PackageJson {
    version: Version,
    dependency_updates: VersionsMap,
}

impl PackageJson {
    /// Create an updater setting the package version
    pub fn new(version: Version) -> Self {
        Self {
            version,
            dependency_updates: VersionsMap::new(),
        }
    }

    /// Also rewrite requirements on these packages
    pub fn with_dependency_updates(mut self, updates: VersionsMap) -> Self {
        self.dependency_updates = updates;
        self
    }
}

impl Updater for PackageJson {
    fn name(&self) -> &'static str {
        "package-json"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content.ok_or_else(|| UpdaterError::MissingContent(FILE.to_string()))?;
        let mut doc = json::parse(FILE, content)?;
        let Some(root) = doc.as_object_mut() else {
            return Err(UpdaterError::Parse {
                file: FILE.to_string(),
                message: "expected a JSON object".to_string(),
            }
            .into());
        };

        debug!(version = %self.version, "updating package.json");
        root.insert("version".to_string(), Value::String(self.version.to_string()));

        for field in DEPENDENCY_FIELDS {
            let Some(deps) = root.get_mut(field).and_then(Value::as_object_mut) else {
                continue;
            };
            for (name, version) in &self.dependency_updates {
                if let Some(Value::String(requirement)) = deps.get_mut(name) {
                    let updated = bump_requirement(requirement, version);
                    debug!(field, dependency = %name, from = %requirement, to = %updated, "updating dependency");
                    *requirement = updated;
                }
            }
        }

        json::to_string(&doc, &json::detect_indent(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let pkg = PackageJsonManifest::parse(r#"{"name": "test", "version": "1.0.0"}"#).unwrap();
        assert_eq!(pkg.name, "test");
        assert_eq!(pkg.version.as_deref(), Some("1.0.0"));
        assert!(!pkg.private);
    }

    #[test]
    fn test_parse_dependencies() {
        let pkg = PackageJsonManifest::parse(
            r#"{
                "name": "test-package",
                "version": "1.2.3",
                "private": true,
                "dependencies": {"lodash": "^4.17.21", "pkgA": "^1.0.0"},
                "devDependencies": {"typescript": "^5.0.0"}
            }"#,
        )
        .unwrap();
        assert!(pkg.private);
        let names: Vec<&str> = pkg.dependency_names().collect();
        assert_eq!(names, vec!["lodash", "pkgA", "typescript"]);
    }

    #[test]
    fn test_parse_error() {
        assert!(PackageJsonManifest::parse("{ not json").is_err());
    }

    #[test]
    fn test_update_version_preserves_fields() {
        let content = "{\n  \"name\": \"test\",\n  \"version\": \"1.0.0\",\n  \"customField\": \"value\"\n}\n";
        let output = PackageJson::new(Version::new(2, 0, 0))
            .update_content(Some(content))
            .unwrap();
        assert_eq!(
            output,
            "{\n  \"name\": \"test\",\n  \"version\": \"2.0.0\",\n  \"customField\": \"value\"\n}\n"
        );
    }

    #[test]
    fn test_update_dependencies_keep_prefix() {
        let content = r#"{
    "name": "pkgB",
    "version": "1.0.0",
    "dependencies": {"pkgA": "^1.0.0", "lodash": "^4.0.0"},
    "devDependencies": {"pkgC": "~2.1.0"}
}"#;
        let mut updates = VersionsMap::new();
        updates.insert("pkgA".to_string(), Version::new(1, 1, 0));
        updates.insert("pkgC".to_string(), Version::new(2, 1, 1));

        let output = PackageJson::new(Version::new(1, 0, 1))
            .with_dependency_updates(updates)
            .update_content(Some(content))
            .unwrap();
        let pkg = PackageJsonManifest::parse(&output).unwrap();
        assert_eq!(pkg.version.as_deref(), Some("1.0.1"));
        assert_eq!(pkg.dependencies["pkgA"], "^1.1.0");
        assert_eq!(pkg.dependencies["lodash"], "^4.0.0");
        assert_eq!(pkg.dev_dependencies["pkgC"], "~2.1.1");
        assert!(output.contains("\n    \"name\""));
    }

    #[test]
    fn test_missing_content() {
        let updater = PackageJson::new(Version::new(1, 0, 0));
        assert!(updater.update_content(None).is_err());
    }
}
