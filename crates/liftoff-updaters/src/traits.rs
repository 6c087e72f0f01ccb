//! Updater trait

use std::fmt;

use liftoff_core::{Result, Version};

/// Trait for file updaters
///
/// Implementations must be pure and idempotent: running an updater on its
/// own output yields the same content again.
pub trait Updater: Send + Sync + fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Compute the new file content from the current one
    fn update_content(&self, content: Option<&str>) -> Result<String>;
}

/// Rewrite a dependency requirement to point at `version`.
///
/// Any range prefix (`^`, `~`, `>=`, `workspace:^`, ...) is kept. A
/// requirement without a version number in it (`*`, `workspace:*`) is
/// returned unchanged.
pub fn bump_requirement(requirement: &str, version: &Version) -> String {
    match requirement.find(|c: char| c.is_ascii_digit()) {
        Some(start) => format!("{}{}", &requirement[..start], version),
        None => requirement.to_string(),
    }
}
