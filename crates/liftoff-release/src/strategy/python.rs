//! Python projects

use std::sync::Arc;

use liftoff_core::{Version, VersionsMap};
use liftoff_updaters::{python, PyProjectToml, SetupCfg};

use super::{BaseStrategy, Strategy};
use crate::candidate::Update;

pub(crate) const MANIFEST_FILE: &str = "pyproject.toml";

/// Project name from `pyproject.toml`
pub(crate) fn package_name(content: &str) -> Option<String> {
    python::project_name(content)
}

/// Releases a Python project
pub struct PythonStrategy {
    base: BaseStrategy,
}

impl PythonStrategy {
    /// Create the strategy
    pub fn new(base: BaseStrategy) -> Self {
        Self { base }
    }
}

impl Strategy for PythonStrategy {
    fn name(&self) -> &'static str {
        "python"
    }

    fn base(&self) -> &BaseStrategy {
        &self.base
    }

    fn initial_version(&self) -> Version {
        Version::new(0, 1, 0)
    }

    fn build_updates(&self, version: &Version, _versions_map: &VersionsMap) -> Vec<Update> {
        vec![
            Update::new(
                self.base.add_path(MANIFEST_FILE),
                Arc::new(PyProjectToml::new(version.clone())),
            ),
            Update::new(
                self.base.add_path("setup.cfg"),
                Arc::new(SetupCfg::new(version.clone())),
            ),
        ]
    }
}
