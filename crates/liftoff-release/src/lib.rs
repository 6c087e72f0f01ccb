//! Liftoff Release - Release pull requests and releases
//!
//! The [`Manifest`] drives both halves of the release cycle:
//!
//! 1. **Release pull requests**: walk history since the last release of
//!    every tracked path, let the path's [`Strategy`] turn its commits into
//!    a candidate, run the configured [`Plugin`] stages over all candidates
//!    and open one pull request per remaining candidate.
//! 2. **Releases**: find merged release pull requests, reconstruct the
//!    release of every path they cover and create tags and releases.
//!
//! Everything the pipeline needs from a hosting platform goes through
//! [`liftoff_git::Hosting`].

pub mod body;
pub mod candidate;
pub mod manifest;
pub mod plugins;
pub mod splitter;
pub mod strategy;
pub mod title;

pub use body::{PullRequestBody, ReleaseData};
pub use candidate::{
    CandidateRelease, CandidateReleasePullRequest, LatestRelease, ReleasePullRequest, Update,
};
pub use manifest::{
    CreatedRelease, Manifest, ManifestContext, OpenedReleasePullRequest,
};
pub use plugins::{Merge, Plugin, PluginContext, WorkspacePlugin};
pub use splitter::CommitSplitter;
pub use strategy::{build_strategy, BaseStrategy, Strategy};
pub use title::PullRequestTitle;
