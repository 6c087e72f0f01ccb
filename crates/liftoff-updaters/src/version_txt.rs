//! `version.txt` updater

use liftoff_core::{Result, Version};

use crate::traits::Updater;

/// Replaces the whole file with the version
#[derive(Debug, Clone)]
pub struct VersionTxt {
    version: Version,
}

impl VersionTxt {
    /// Create an updater writing `version`
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl Updater for VersionTxt {
    fn name(&self) -> &'static str {
        "version-txt"
    }

    fn update_content(&self, _content: Option<&str>) -> Result<String> {
        Ok(format!("{}\n", self.version))
    }
}
