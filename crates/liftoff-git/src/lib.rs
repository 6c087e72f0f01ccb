//! Liftoff Git - Hosting collaborator interface and backends
//!
//! This crate defines the [`Hosting`] trait the release pipeline talks to,
//! lazy paginated [`History`] sequences over commits, releases and merged
//! pull requests, the tag and branch naming conventions, and two backends:
//! an in-memory [`MemoryHosting`] and a git2-backed read-only
//! [`LocalRepository`].

mod branch;
mod commits;
mod history;
mod hosting;
mod local;
pub mod memory;
mod tags;
pub mod types;

pub use branch::BranchName;
pub use history::{History, Page};
pub use hosting::Hosting;
pub use local::LocalRepository;
pub use memory::MemoryHosting;
pub use tags::TagName;
pub use types::{
    Commit, FileChange, FileContents, HostedRelease, PullRequest, PullRequestRequest,
    ReleaseRequest, RepositoryInfo,
};
