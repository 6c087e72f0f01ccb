//! Liftoff Updaters - Version-bearing file updaters
//!
//! Every updater is a pure function from the current file content (absent
//! when the file does not exist yet) to the new content. Updaters never
//! touch the filesystem or the hosting backend; the release pipeline
//! fetches content, runs the updater and commits the result.
//!
//! Ecosystem specific manifests live in their own modules ([`npm`],
//! [`cargo`], [`python`]); format agnostic updaters cover changelogs,
//! marker comments and values addressed by a path in JSON, YAML or TOML.

pub mod cargo;
pub mod changelog;
mod composite;
mod generic;
mod java;
mod json;
pub mod npm;
pub mod python;
mod release_manifest;
mod structured;
mod traits;
mod version_txt;

pub use cargo::{CargoLock, CargoManifest, CargoToml};
pub use changelog::{merge_dependency_notes, ChangelogUpdater, DependencyNotesUpdater};
pub use composite::CompositeUpdater;
pub use generic::Generic;
pub use java::JavaMarkers;
pub use npm::{PackageJson, PackageJsonManifest, PackageLockJson};
pub use python::{PyProjectToml, SetupCfg};
pub use release_manifest::ReleasedVersionsJson;
pub use structured::{JsonPathUpdater, TomlPathUpdater, YamlPathUpdater};
pub use traits::{bump_requirement, Updater};
pub use version_txt::VersionTxt;
