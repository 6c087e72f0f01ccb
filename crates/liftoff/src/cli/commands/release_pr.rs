//! Release pull request command

use clap::Args;
use tracing::info;

use super::ManifestArgs;
use crate::cli::output::{path_style, tag_style, version_style, Printer};

/// Build release pull requests from unreleased commits
#[derive(Debug, Args)]
pub struct ReleasePrCommand {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Show what would be opened without opening anything
    #[arg(long)]
    pub dry_run: bool,
}

impl ReleasePrCommand {
    /// Execute the release-pr command
    pub async fn execute(&self, printer: &Printer) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing release-pr command");
        let manifest = self.manifest.load(self.dry_run, "opening pull requests").await?;
        let opened = manifest.create_pull_requests().await?;

        if printer.is_json() {
            return printer.json(&opened);
        }
        if opened.is_empty() {
            printer.warning("Nothing to release");
            return Ok(());
        }

        for pr in &opened {
            printer.header(&pr.request.title);
            printer.key_value("Branch", &tag_style().apply_to(&pr.request.head_branch).to_string());
            for (path, version) in &pr.versions {
                printer.key_value(
                    &path_style().apply_to(path).to_string(),
                    &version_style().apply_to(version).to_string(),
                );
            }
            for change in &pr.request.changes {
                printer.info(&change.path);
            }
            match pr.number {
                Some(number) => printer.success(&format!("Opened pull request #{}", number)),
                None => printer.plain(&pr.request.head_branch),
            }
        }
        Ok(())
    }
}
