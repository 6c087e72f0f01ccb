//! Configuration loading

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::version::Version;

use super::defaults::{config_file_names, DEFAULT_MANIFEST_FILE};
use super::types::ManifestConfig;
use super::validation::validate_config;

/// Last released version per tracked path
pub type ReleasedVersions = BTreeMap<String, Version>;

/// Parse and validate manifest configuration from JSON text
pub fn parse_manifest_config(content: &str) -> Result<ManifestConfig> {
    let config: ManifestConfig =
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse the released-versions manifest from JSON text
///
/// Entries whose version cannot be parsed are rejected: the manifest is the
/// source of truth for the next bump.
pub fn parse_released_versions(content: &str) -> Result<ReleasedVersions> {
    let raw: BTreeMap<String, String> =
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let mut versions = ReleasedVersions::new();
    for (path, version) in raw {
        let parsed = Version::parse(&version).map_err(|e| ConfigError::InvalidValue {
            field: format!("manifest[{}]", path),
            message: e.to_string(),
        })?;
        versions.insert(path, parsed);
    }
    Ok(versions)
}

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<ManifestConfig> {
    info!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io(e)
        }
    })?;

    let config = parse_manifest_config(&content)?;
    debug!(
        path = %path.display(),
        packages = config.packages.len(),
        "config loaded and validated"
    );
    Ok(config)
}

/// Load released versions from a manifest file
pub fn load_released_versions(path: &Path) -> Result<ReleasedVersions> {
    info!(path = %path.display(), "loading released versions");
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io(e)
        }
    })?;
    parse_released_versions(&content)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level every name from [`config_file_names`] is checked;
/// the first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration and released versions from a repository checkout
///
/// The manifest file is looked up next to the configuration file; a missing
/// manifest yields an empty version map.
pub fn load_from_dir(dir: &Path) -> Result<(ManifestConfig, ReleasedVersions, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;
    let config = load_config(&config_path)?;

    let manifest_path = config_path
        .parent()
        .map(|p| p.join(DEFAULT_MANIFEST_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_FILE));
    let versions = if manifest_path.exists() {
        load_released_versions(&manifest_path)?
    } else {
        debug!(path = %manifest_path.display(), "no manifest file, starting from scratch");
        ReleasedVersions::new()
    };

    Ok((config, versions, config_path))
}
