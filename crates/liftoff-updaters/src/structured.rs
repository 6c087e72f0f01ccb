//! Updaters for a single value addressed by a path in JSON, YAML or TOML
//!
//! Paths use the `$.a.b[0].c` form; the leading `$` is optional. A path
//! that does not resolve leaves the file unchanged.

use liftoff_core::{Result, UpdaterError, Version};
use toml_edit::{DocumentMut, Item};
use tracing::warn;

use crate::cargo::set_string;
use crate::json;
use crate::traits::Updater;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let invalid = |message: &str| UpdaterError::Parse {
        file: path.to_string(),
        message: message.to_string(),
    };

    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);

    let mut segments = Vec::new();
    for part in trimmed.split('.') {
        let (key, mut indexes) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };
        if key.is_empty() && indexes.is_empty() {
            return Err(invalid("empty path segment").into());
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        }
        while let Some(rest) = indexes.strip_prefix('[') {
            let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
            let index = rest[..close]
                .parse()
                .map_err(|_| invalid("array index must be a number"))?;
            segments.push(Segment::Index(index));
            indexes = &rest[close + 1..];
        }
        if !indexes.is_empty() {
            return Err(invalid("unexpected characters after index").into());
        }
    }
    Ok(segments)
}

fn json_target<'a>(
    value: &'a mut serde_json::Value,
    path: &[Segment],
) -> Option<&'a mut serde_json::Value> {
    match path.split_first() {
        None => Some(value),
        Some((Segment::Key(key), rest)) => json_target(value.get_mut(key.as_str())?, rest),
        Some((Segment::Index(index), rest)) => json_target(value.get_mut(*index)?, rest),
    }
}

fn yaml_target<'a>(
    value: &'a mut serde_yaml::Value,
    path: &[Segment],
) -> Option<&'a mut serde_yaml::Value> {
    match path.split_first() {
        None => Some(value),
        Some((Segment::Key(key), rest)) => yaml_target(value.get_mut(key.as_str())?, rest),
        Some((Segment::Index(index), rest)) => yaml_target(value.get_mut(*index)?, rest),
    }
}

fn toml_target<'a>(item: &'a mut Item, path: &[Segment]) -> Option<&'a mut Item> {
    match path.split_first() {
        None => Some(item),
        Some((Segment::Key(key), rest)) => toml_target(item.get_mut(key.as_str())?, rest),
        Some((Segment::Index(index), rest)) => toml_target(item.get_mut(*index)?, rest),
    }
}

/// Sets a JSON value to the version
#[derive(Debug, Clone)]
pub struct JsonPathUpdater {
    json_path: String,
    version: Version,
}

impl JsonPathUpdater {
    /// Create an updater for `json_path`
    pub fn new(json_path: impl Into<String>, version: Version) -> Self {
        Self {
            json_path: json_path.into(),
            version,
        }
    }
}

impl Updater for JsonPathUpdater {
    fn name(&self) -> &'static str {
        "json-path"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent("json file".to_string()))?;
        let path = parse_path(&self.json_path)?;
        let mut doc = json::parse("json file", content)?;

        match json_target(&mut doc, &path) {
            Some(target) => *target = serde_json::Value::String(self.version.to_string()),
            None => {
                warn!(path = %self.json_path, "path not found in json file");
                return Ok(content.to_string());
            }
        }
        json::to_string(&doc, &json::detect_indent(content))
    }
}

/// Sets a YAML value to the version
#[derive(Debug, Clone)]
pub struct YamlPathUpdater {
    json_path: String,
    version: Version,
}

impl YamlPathUpdater {
    /// Create an updater for `json_path`
    pub fn new(json_path: impl Into<String>, version: Version) -> Self {
        Self {
            json_path: json_path.into(),
            version,
        }
    }
}

impl Updater for YamlPathUpdater {
    fn name(&self) -> &'static str {
        "yaml-path"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent("yaml file".to_string()))?;
        let path = parse_path(&self.json_path)?;
        let mut doc: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| UpdaterError::Parse {
                file: "yaml file".to_string(),
                message: e.to_string(),
            })?;

        match yaml_target(&mut doc, &path) {
            Some(target) => *target = serde_yaml::Value::String(self.version.to_string()),
            None => {
                warn!(path = %self.json_path, "path not found in yaml file");
                return Ok(content.to_string());
            }
        }
        serde_yaml::to_string(&doc).map_err(|e| {
            UpdaterError::Parse {
                file: "yaml file".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Sets a TOML value to the version, preserving formatting
#[derive(Debug, Clone)]
pub struct TomlPathUpdater {
    json_path: String,
    version: Version,
}

impl TomlPathUpdater {
    /// Create an updater for `json_path`
    pub fn new(json_path: impl Into<String>, version: Version) -> Self {
        Self {
            json_path: json_path.into(),
            version,
        }
    }
}

impl Updater for TomlPathUpdater {
    fn name(&self) -> &'static str {
        "toml-path"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent("toml file".to_string()))?;
        let path = parse_path(&self.json_path)?;
        let mut doc: DocumentMut =
            content
                .parse()
                .map_err(|e: toml_edit::TomlError| UpdaterError::Parse {
                    file: "toml file".to_string(),
                    message: e.to_string(),
                })?;

        match toml_target(doc.as_item_mut(), &path) {
            Some(target) => set_string(target, &self.version.to_string()),
            None => {
                warn!(path = %self.json_path, "path not found in toml file");
                return Ok(content.to_string());
            }
        }
        Ok(doc.to_string())
    }
}
