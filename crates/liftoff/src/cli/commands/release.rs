//! Release command

use clap::Args;
use tracing::info;

use super::ManifestArgs;
use crate::cli::output::{tag_style, Printer};

/// Tag and release merged release pull requests
#[derive(Debug, Args)]
pub struct ReleaseCommand {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Show what would be released without creating anything
    #[arg(long)]
    pub dry_run: bool,
}

impl ReleaseCommand {
    /// Execute the release command
    pub async fn execute(&self, printer: &Printer) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing release command");
        let manifest = self.manifest.load(self.dry_run, "creating releases").await?;
        let created = manifest.create_releases().await?;

        if printer.is_json() {
            return printer.json(&created);
        }
        if created.is_empty() {
            printer.warning("No merged release pull requests pending");
            return Ok(());
        }

        for release in &created {
            let tag = tag_style().apply_to(&release.tag).to_string();
            if release.already_existed {
                printer.warning(&format!("{} already exists", tag));
            } else if manifest.is_dry_run() {
                printer.plain(&release.tag);
                printer.key_value("Commit", &release.sha);
                printer.key_value("Pull request", &format!("#{}", release.pull_request_number));
            } else {
                printer.success(&format!("Released {}", tag));
                if let Some(url) = &release.url {
                    printer.key_value("URL", url);
                }
            }
        }
        Ok(())
    }
}
