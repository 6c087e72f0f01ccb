//! Plugin stages run over all release candidates
//!
//! Every stage receives the full candidate list and returns a rebuilt one.
//! Stages run sequentially in configuration order; the manifest appends
//! a [`Merge`] stage unless separate pull requests are requested.

mod merge;
mod workspace;

use async_trait::async_trait;
use liftoff_core::config::PluginConfig;
use liftoff_core::Result;
use liftoff_git::Hosting;

use crate::candidate::CandidateReleasePullRequest;
use crate::manifest::ManifestContext;

pub use merge::Merge;
pub use workspace::{
    CargoWorkspace, DependencyGraph, NodeWorkspace, WorkspaceDependency, WorkspaceEcosystem,
    WorkspacePackage, WorkspacePlugin,
};

/// Shared inputs of a plugin stage
#[derive(Clone, Copy)]
pub struct PluginContext<'a> {
    /// Hosting backend, for files the candidates did not fetch
    pub hosting: &'a dyn Hosting,
    /// Resolved manifest state
    pub manifest: &'a ManifestContext,
}

/// A stage transforming the list of release candidates
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Get the plugin name
    fn name(&self) -> &'static str;

    /// Transform the candidates
    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>>;
}

/// Instantiate the configured plugins, in order
pub fn build_plugins(configs: &[PluginConfig]) -> Vec<Box<dyn Plugin>> {
    configs
        .iter()
        .map(|config| -> Box<dyn Plugin> {
            match config {
                PluginConfig::NodeWorkspace(options) => {
                    Box::new(WorkspacePlugin::new(NodeWorkspace, options.clone()))
                }
                PluginConfig::CargoWorkspace(options) => {
                    Box::new(WorkspacePlugin::new(CargoWorkspace, options.clone()))
                }
            }
        })
        .collect()
}
