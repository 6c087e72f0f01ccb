//! CLI commands

mod next_version;
mod release;
mod release_pr;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use liftoff_core::config::{
    load_config, load_from_dir, load_released_versions, ManifestConfig, ReleasedVersions,
    DEFAULT_MANIFEST_FILE,
};
use liftoff_core::HostingError;
use liftoff_git::LocalRepository;
use liftoff_release::Manifest;
use tracing::{debug, info};

pub use next_version::NextVersionCommand;
pub use release::ReleaseCommand;
pub use release_pr::ReleasePrCommand;

/// Options locating the repository and its manifest
#[derive(Debug, Args)]
pub struct ManifestArgs {
    /// Branch releases are cut from (default: the checked out branch)
    #[arg(long)]
    pub target_branch: Option<String>,

    /// Config file (default: liftoff-config.json, searched upwards)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ManifestArgs {
    fn load_config(&self, cwd: &std::path::Path) -> anyhow::Result<(ManifestConfig, ReleasedVersions)> {
        let Some(path) = &self.config else {
            let (config, versions, path) = load_from_dir(cwd)?;
            debug!(path = %path.display(), "using discovered config");
            return Ok((config, versions));
        };

        let config = load_config(path)?;
        let manifest_path = path
            .parent()
            .map(|dir| dir.join(DEFAULT_MANIFEST_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_FILE));
        let versions = if manifest_path.exists() {
            load_released_versions(&manifest_path)?
        } else {
            ReleasedVersions::new()
        };
        Ok((config, versions))
    }

    /// Resolve the manifest over the local repository.
    ///
    /// The local backend cannot open pull requests or create releases, so
    /// only dry runs are accepted.
    pub async fn load(&self, dry_run: bool, operation: &str) -> anyhow::Result<Manifest> {
        if !dry_run {
            return Err(liftoff_core::LiftoffError::from(HostingError::Unsupported(format!(
                "{} on a local repository (use --dry-run)",
                operation
            )))
            .into());
        }

        let cwd = std::env::current_dir()?;
        let repository = LocalRepository::discover(&cwd)?;
        let (config, versions) = self.load_config(repository.path())?;
        info!(
            repository = %repository.path().display(),
            packages = config.packages.len(),
            "loaded manifest"
        );

        let manifest = Manifest::new(
            Arc::new(repository),
            config,
            versions,
            self.target_branch.as_deref(),
        )
        .await?;
        Ok(manifest.with_dry_run(dry_run))
    }
}
