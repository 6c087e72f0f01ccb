//! npm packages

use std::sync::Arc;

use liftoff_core::{Version, VersionsMap};
use liftoff_updaters::{PackageJson, PackageJsonManifest, PackageLockJson};

use super::{BaseStrategy, Strategy};
use crate::candidate::Update;

pub(crate) const MANIFEST_FILE: &str = "package.json";

const LOCK_FILES: [&str; 2] = ["package-lock.json", "npm-shrinkwrap.json"];

/// Package name from `package.json`
pub(crate) fn package_name(content: &str) -> Option<String> {
    PackageJsonManifest::parse(content).ok().map(|manifest| manifest.name)
}

/// Component of a package: the name without its `@scope/`
pub(crate) fn component_name(package_name: &str) -> String {
    match package_name.strip_prefix('@').and_then(|rest| rest.split_once('/')) {
        Some((_, name)) => name.to_string(),
        None => package_name.to_string(),
    }
}

/// Releases an npm package
pub struct NodeStrategy {
    base: BaseStrategy,
}

impl NodeStrategy {
    /// Create the strategy
    pub fn new(base: BaseStrategy) -> Self {
        Self { base }
    }
}

impl Strategy for NodeStrategy {
    fn name(&self) -> &'static str {
        "node"
    }

    fn base(&self) -> &BaseStrategy {
        &self.base
    }

    fn build_updates(&self, version: &Version, versions_map: &VersionsMap) -> Vec<Update> {
        let mut updates = vec![Update::new(
            self.base.add_path(MANIFEST_FILE),
            Arc::new(PackageJson::new(version.clone())),
        )];
        updates.extend(LOCK_FILES.iter().map(|file| {
            Update::new(
                self.base.add_path(file),
                Arc::new(
                    PackageLockJson::new(version.clone()).with_versions_map(versions_map.clone()),
                ),
            )
        }));
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::build_strategy;
    use super::*;
    use liftoff_core::config::ReleaserConfig;
    use liftoff_core::ReleaseType;

    #[test]
    fn test_component_name() {
        assert_eq!(component_name("@acme/widget"), "widget");
        assert_eq!(component_name("widget"), "widget");
    }

    #[tokio::test]
    async fn test_node_release() {
        let hosting = hosting().with_file(
            "main",
            "package.json",
            r#"{"name": "some-node-package", "version": "0.123.4"}"#,
        );
        let config = ReleaserConfig {
            release_type: Some(ReleaseType::Node),
            ..Default::default()
        };
        let strategy = build_strategy(&hosting, options(".", config)).await.unwrap();
        let pr = strategy
            .build_release_pull_request(
                &commits(&["fix: bugfix"]),
                Some(&latest("some-node-package-v0.123.4")),
            )
            .unwrap()
            .unwrap();

        assert_eq!(pr.version, Some(Version::new(0, 123, 5)));
        assert_eq!(
            pr.title.to_string(),
            "chore(main): release some-node-package 0.123.5"
        );
        assert!(pr.body.releases[0].notes.contains("### Bug Fixes"));
        assert_eq!(
            update_paths(&pr),
            vec![
                "CHANGELOG.md",
                "package.json",
                "package-lock.json",
                "npm-shrinkwrap.json"
            ]
        );

        let updated = pr.updates[1]
            .updater
            .update_content(Some(r#"{"name": "some-node-package", "version": "0.123.4"}"#))
            .unwrap();
        assert!(updated.contains("\"version\": \"0.123.5\""));
    }
}
