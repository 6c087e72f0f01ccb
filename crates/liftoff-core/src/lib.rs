//! Liftoff Core - Core library for release automation
//!
//! This crate provides the foundational types shared by every Liftoff crate:
//! the [`Version`] value, the error taxonomy, and the manifest configuration
//! model (per-path releaser settings plus last-released versions).

pub mod config;
pub mod error;
pub mod types;
pub mod version;

pub use error::{
    ConfigError, HostingError, LiftoffError, ReleaseError, Result, UpdaterError, VersionError,
    WorkspaceError,
};
pub use types::{ReleaseType, VersioningKind, ROOT_PROJECT_PATH};
pub use version::{Version, VersionsMap};
