//! Error types for Liftoff

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LiftoffError
pub type Result<T> = std::result::Result<T, LiftoffError>;

/// Main error type for Liftoff operations
#[derive(Debug, Error)]
pub enum LiftoffError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Hosting collaborator errors
    #[error(transparent)]
    Hosting(#[from] HostingError),

    /// File updater errors
    #[error(transparent)]
    Updater(#[from] UpdaterError),

    /// Release pull request / release reconstruction errors
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Workspace dependency graph errors
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl LiftoffError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this error reports something that already exists remotely.
    ///
    /// Callers creating tags or releases treat this as an idempotent success.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::Hosting(HostingError::AlreadyExists(_)))
    }

    /// Whether this error reports a missing file on the hosting side
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, Self::Hosting(HostingError::FileNotFound { .. }))
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Two tracked paths resolved to the same component name
    #[error("Component '{component}' is used by both '{first}' and '{second}'")]
    DuplicateComponent {
        component: String,
        first: String,
        second: String,
    },

    /// Unknown plugin type
    #[error("Unknown plugin type: {0}")]
    UnknownPlugin(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse version
    #[error("Failed to parse version '{0}': {1}")]
    Parse(String, String),

    /// The strategy could not compute a next version
    #[error("Cannot bump version {version}: {reason}")]
    Bump { version: String, reason: String },
}

/// Errors raised by the hosting collaborator
#[derive(Debug, Error)]
pub enum HostingError {
    /// The requested file does not exist on the branch
    #[error("File '{path}' not found on branch '{branch}'")]
    FileNotFound { path: String, branch: String },

    /// A tag, release or pull request already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The backend does not support this operation
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Branch does not exist
    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    /// Malformed data returned by the backend
    #[error("Unexpected response from hosting backend: {0}")]
    InvalidResponse(String),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// File updater errors
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// The updater needs existing content but none was supplied
    #[error("Cannot update missing file: {0}")]
    MissingContent(String),

    /// Failed to parse the file
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// An expected field is absent
    #[error("Field '{field}' not found in {file}")]
    MissingField { file: String, field: String },
}

/// Release pull request and release reconstruction errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A merged pull request does not have the shape of a release pull request
    #[error("Pull request #{number} is not a release pull request: {reason}")]
    MalformedPullRequest { number: u64, reason: String },

    /// The pull request body has no entry for the component
    #[error("No release data for component '{component}' in pull request #{number}")]
    MissingReleaseData { number: u64, component: String },
}

/// Workspace dependency graph errors
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Circular dependency between workspace packages
    #[error("Found cycle in dependency graph: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// A package referenced by name is not part of the graph
    #[error("Package not found in workspace graph: {0}")]
    UnknownPackage(String),
}
