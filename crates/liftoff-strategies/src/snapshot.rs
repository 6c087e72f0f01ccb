//! Java snapshot versioning

use std::sync::Arc;

use liftoff_changelog::ClassifiedCommit;
use liftoff_core::{Result, Version};

use crate::traits::{apply_bump, VersioningStrategy};
use crate::types::VersionBump;

/// Pre-release marker of development versions
const SNAPSHOT: &str = "SNAPSHOT";

/// Wraps another strategy with Java `-SNAPSHOT` semantics.
///
/// After a release the next version is a patch bump marked `-SNAPSHOT`.
/// Releasing from a snapshot drops the marker: the snapshot already carries
/// the patch bump, so only larger bumps from the inner strategy move it
/// further.
#[derive(Clone)]
pub struct JavaSnapshot {
    inner: Arc<dyn VersioningStrategy>,
}

impl JavaSnapshot {
    /// Wrap a strategy
    pub fn new(inner: Arc<dyn VersioningStrategy>) -> Self {
        Self { inner }
    }

    /// Whether a version is a snapshot
    pub fn is_snapshot(version: &Version) -> bool {
        version
            .pre_release
            .as_deref()
            .is_some_and(|pre| pre.ends_with(SNAPSHOT))
    }
}

impl VersioningStrategy for JavaSnapshot {
    fn name(&self) -> &'static str {
        "java-snapshot"
    }

    fn determine_release_type(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<VersionBump> {
        if !Self::is_snapshot(current) {
            let next = apply_bump(current, &VersionBump::Patch).with_pre_release(SNAPSHOT);
            return Ok(VersionBump::Custom(next));
        }

        let base = current.clone().without_pre_release();
        let next = match self.inner.determine_release_type(&base, commits)? {
            VersionBump::Patch => base,
            other => self.inner.do_bump(&base, &other)?,
        };
        Ok(VersionBump::Custom(next))
    }
}
