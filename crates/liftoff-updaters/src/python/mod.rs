//! Python project files: `pyproject.toml` and `setup.cfg`

use std::sync::LazyLock;

use liftoff_core::{Result, UpdaterError, Version};
use regex::Regex;
use toml_edit::{DocumentMut, Item};
use tracing::{debug, warn};

use crate::cargo::set_string;
use crate::traits::Updater;

const PYPROJECT: &str = "pyproject.toml";
const SETUP_CFG: &str = "setup.cfg";

/// `version = x` inside the `[metadata]` section of setup.cfg
static SETUP_CFG_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<prefix>version\s*=\s*)(?P<version>\S+)\s*$").expect("Invalid regex")
});

fn parse_pyproject(content: &str) -> Result<DocumentMut> {
    content
        .parse()
        .map_err(|e: toml_edit::TomlError| {
            UpdaterError::Parse {
                file: PYPROJECT.to_string(),
                message: e.to_string(),
            }
            .into()
        })
}

/// Project name from pyproject.toml (`[project]` or `[tool.poetry]`)
pub fn project_name(content: &str) -> Option<String> {
    let doc = parse_pyproject(content).ok()?;
    doc.get("project")
        .and_then(|project| project.get("name"))
        .or_else(|| {
            doc.get("tool")
                .and_then(|tool| tool.get("poetry"))
                .and_then(|poetry| poetry.get("name"))
        })
        .and_then(Item::as_str)
        .map(str::to_string)
}

/// Updates the version of a pyproject.toml
#[derive(Debug, Clone)]
pub struct PyProjectToml {
    version: Version,
}

impl PyProjectToml {
    /// Create an updater setting `version`
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl Updater for PyProjectToml {
    fn name(&self) -> &'static str {
        "pyproject-toml"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent(PYPROJECT.to_string()))?;
        let mut doc = parse_pyproject(content)?;

        let is_dynamic = doc
            .get("project")
            .and_then(|project| project.get("dynamic"))
            .and_then(Item::as_array)
            .is_some_and(|dynamic| dynamic.iter().any(|v| v.as_str() == Some("version")));
        if is_dynamic {
            warn!("pyproject.toml declares a dynamic version, leaving it unchanged");
            return Ok(content.to_string());
        }

        let in_project = doc
            .get("project")
            .and_then(|project| project.get("version"))
            .is_some_and(Item::is_str);
        let target = if in_project {
            doc.get_mut("project")
                .and_then(|project| project.get_mut("version"))
        } else {
            doc.get_mut("tool")
                .and_then(|tool| tool.get_mut("poetry"))
                .and_then(|poetry| poetry.get_mut("version"))
                .filter(|version| version.is_str())
        };

        let Some(current) = target else {
            return Err(UpdaterError::MissingField {
                file: PYPROJECT.to_string(),
                field: "project.version".to_string(),
            }
            .into());
        };
        debug!(version = %self.version, "updating pyproject.toml");
        set_string(current, &self.version.to_string());
        Ok(doc.to_string())
    }
}

/// Updates the `version` key of a setup.cfg
#[derive(Debug, Clone)]
pub struct SetupCfg {
    version: Version,
}

impl SetupCfg {
    /// Create an updater setting `version`
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl Updater for SetupCfg {
    fn name(&self) -> &'static str {
        "setup-cfg"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content =
            content.ok_or_else(|| UpdaterError::MissingContent(SETUP_CFG.to_string()))?;
        if !SETUP_CFG_VERSION_REGEX.is_match(content) {
            return Err(UpdaterError::MissingField {
                file: SETUP_CFG.to_string(),
                field: "version".to_string(),
            }
            .into());
        }
        let version = self.version.to_string();
        Ok(SETUP_CFG_VERSION_REGEX
            .replacen(content, 1, |caps: &regex::Captures<'_>| {
                format!("{}{}", &caps["prefix"], version)
            })
            .into_owned())
    }
}
