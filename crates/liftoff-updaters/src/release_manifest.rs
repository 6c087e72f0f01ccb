//! `.liftoff-manifest.json` updater

use liftoff_core::{Result, VersionsMap};
use serde_json::{Map, Value};

use crate::json;
use crate::traits::Updater;

const FILE: &str = ".liftoff-manifest.json";

/// Records released versions keyed by tracked path.
///
/// Entries for other paths are kept as they are; a missing file starts an
/// empty manifest.
#[derive(Debug, Clone)]
pub struct ReleasedVersionsJson {
    versions: VersionsMap,
}

impl ReleasedVersionsJson {
    /// Create an updater recording `versions` (path to version)
    pub fn new(versions: VersionsMap) -> Self {
        Self { versions }
    }
}

impl Updater for ReleasedVersionsJson {
    fn name(&self) -> &'static str {
        "released-versions"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let (mut doc, indent) = match content.filter(|c| !c.trim().is_empty()) {
            Some(content) => (json::parse(FILE, content)?, json::detect_indent(content)),
            None => (Value::Object(Map::new()), "  ".to_string()),
        };

        if let Some(entries) = doc.as_object_mut() {
            for (path, version) in &self.versions {
                entries.insert(path.clone(), Value::String(version.to_string()));
            }
        }
        json::to_string(&doc, &indent)
    }
}
