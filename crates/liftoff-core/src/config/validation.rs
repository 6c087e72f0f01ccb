//! Configuration validation

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::{ManifestConfig, ReleaserConfig};

/// Validate configuration
pub fn validate_config(config: &ManifestConfig) -> Result<()> {
    debug!("validating configuration");
    validate_releaser("defaults", &config.defaults)?;
    validate_packages(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_releaser(field: &str, config: &ReleaserConfig) -> Result<()> {
    if let Some(separator) = &config.tag_separator {
        if separator.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.tag-separator", field),
                message: "tag separator cannot be empty".to_string(),
            }
            .into());
        }
    }

    if let Some(pattern) = &config.pull_request_title_pattern {
        if !pattern.contains("${version}") {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.pull-request-title-pattern", field),
                message: "must contain ${version} placeholder".to_string(),
            }
            .into());
        }
    }

    for (i, file) in config.extra_files().iter().enumerate() {
        if file.path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.extra-files[{}]", field, i),
                message: "path cannot be empty".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_packages(config: &ManifestConfig) -> Result<()> {
    if !config.packages.is_empty() {
        debug!(count = config.packages.len(), "validating packages");
    }
    for (path, package) in &config.packages {
        if path.is_empty() || path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: format!("packages[{}]", path),
                message: "path must be relative to the repository root".to_string(),
            }
            .into());
        }
        validate_releaser(&format!("packages[{}]", path), package)?;
    }

    Ok(())
}

/// Validate that resolved component names are unique across paths
///
/// `components` pairs each tracked path with its resolved component; paths
/// without a component (an empty name) are ignored.
pub fn validate_components<'a, I>(components: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for (path, component) in components {
        if component.is_empty() {
            continue;
        }
        if let Some(first) = seen.insert(component, path) {
            return Err(ConfigError::DuplicateComponent {
                component: component.to_string(),
                first: first.to_string(),
                second: path.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiftoffError;

    #[test]
    fn test_validate_default_config() {
        let config = ManifestConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_separator() {
        let mut config = ManifestConfig::default();
        config.defaults.tag_separator = Some(String::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_title_pattern() {
        let mut config = ManifestConfig::default();
        config.packages.insert(
            "a".to_string(),
            ReleaserConfig {
                pull_request_title_pattern: Some("chore: release".to_string()),
                ..Default::default()
            },
        );
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_absolute_path() {
        let mut config = ManifestConfig::default();
        config
            .packages
            .insert("/abs".to_string(), ReleaserConfig::default());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_components() {
        let ok = validate_components([("a", "pkg-a"), ("b", "pkg-b"), (".", "")]);
        assert!(ok.is_ok());

        let err = validate_components([("a", "pkg"), ("b", "pkg")]).unwrap_err();
        assert!(matches!(
            err,
            LiftoffError::Config(ConfigError::DuplicateComponent { .. })
        ));
    }
}
