//! Liftoff Strategies - Versioning strategies
//!
//! A [`VersioningStrategy`] classifies the commits since the last release
//! into a [`VersionBump`] and applies it to the current version. Strategies
//! are selected per path from configuration through [`strategy_for`].

mod always;
mod default;
mod dependency_manifest;
mod prerelease;
mod registry;
mod service_pack;
mod snapshot;
mod traits;
pub mod types;

pub use always::{AlwaysBumpMajor, AlwaysBumpMinor, AlwaysBumpPatch};
pub use default::DefaultVersioning;
pub use dependency_manifest::DependencyManifest;
pub use prerelease::PrereleaseVersioning;
pub use registry::strategy_for;
pub use service_pack::ServicePack;
pub use snapshot::JavaSnapshot;
pub use traits::{apply_bump, release_as_override, VersioningStrategy};
pub use types::VersionBump;

#[cfg(test)]
pub(crate) mod test_support {
    use liftoff_changelog::{classify, ClassifiedCommit};
    use liftoff_git::Commit;

    /// Classify messages as commits with sequential fake hashes
    pub fn commits(messages: &[&str]) -> Vec<ClassifiedCommit> {
        let raw: Vec<Commit> = messages
            .iter()
            .enumerate()
            .map(|(i, message)| Commit::new(format!("{:07}abcdef", i), *message))
            .collect();
        classify(&raw)
    }
}
