//! Next version command

use clap::Args;
use tracing::info;

use super::ManifestArgs;
use crate::cli::output::{path_style, version_style, Printer};

/// Show the next version of every path with unreleased changes
#[derive(Debug, Args)]
pub struct NextVersionCommand {
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

impl NextVersionCommand {
    /// Execute the next-version command
    pub async fn execute(&self, printer: &Printer) -> anyhow::Result<()> {
        info!("executing next-version command");
        // computing versions never mutates anything
        let manifest = self.manifest.load(true, "computing versions").await?;
        let versions = manifest.next_versions().await?;

        if printer.is_json() {
            let versions: std::collections::BTreeMap<&str, String> = versions
                .iter()
                .map(|(path, version)| (path.as_str(), version.to_string()))
                .collect();
            return printer.json(&versions);
        }
        if versions.is_empty() {
            printer.warning("Nothing to release");
            return Ok(());
        }

        printer.header("Next versions");
        for (path, version) in &versions {
            printer.plain(&format!(
                "{} {}",
                path_style().apply_to(path),
                version_style().apply_to(version)
            ));
        }
        Ok(())
    }
}
