//! Plain `version.txt` releases

use std::sync::Arc;

use liftoff_core::{Version, VersionsMap};
use liftoff_updaters::VersionTxt;

use super::{BaseStrategy, Strategy};
use crate::candidate::Update;

/// Releases a path whose version lives in `version.txt`
pub struct SimpleStrategy {
    base: BaseStrategy,
}

impl SimpleStrategy {
    /// Create the strategy
    pub fn new(base: BaseStrategy) -> Self {
        Self { base }
    }
}

impl Strategy for SimpleStrategy {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn base(&self) -> &BaseStrategy {
        &self.base
    }

    fn build_updates(&self, version: &Version, _versions_map: &VersionsMap) -> Vec<Update> {
        vec![Update::new(
            self.base.add_path("version.txt"),
            Arc::new(VersionTxt::new(version.clone())),
        )]
    }
}
