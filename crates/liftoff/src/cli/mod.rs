//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{NextVersionCommand, ReleaseCommand, ReleasePrCommand};
use output::Printer;

/// Liftoff - Release pull requests from conventional commits
#[derive(Debug, Parser)]
#[command(name = "liftoff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build (and open) release pull requests
    ReleasePr(ReleasePrCommand),

    /// Tag and release merged release pull requests
    Release(ReleaseCommand),

    /// Show the next version of every path with unreleased changes
    NextVersion(NextVersionCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        let printer = Printer::new(self.format, self.quiet);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            match &self.command {
                Commands::ReleasePr(cmd) => cmd.execute(&printer).await,
                Commands::Release(cmd) => cmd.execute(&printer).await,
                Commands::NextVersion(cmd) => cmd.execute(&printer).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_pr() {
        let cli = Cli::try_parse_from([
            "liftoff",
            "--format",
            "json",
            "release-pr",
            "--dry-run",
            "--target-branch",
            "develop",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::ReleasePr(cmd) => {
                assert!(cmd.dry_run);
                assert_eq!(cmd.manifest.target_branch.as_deref(), Some("develop"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["liftoff", "next-version", "-q", "-C", "/tmp"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.directory.as_deref(), Some(std::path::Path::new("/tmp")));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["liftoff", "-q", "-v", "release"]).is_err());
    }
}
