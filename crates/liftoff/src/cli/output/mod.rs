//! Output formatting utilities

use console::{style, Style};
use serde::Serialize;

use super::OutputFormat;

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Style for version numbers
pub fn version_style() -> Style {
    Style::new().green().bold()
}

/// Style for tags and branches
pub fn tag_style() -> Style {
    Style::new().yellow()
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Writes command results in the selected format.
///
/// Status lines are dropped in JSON mode and when quiet, so stdout only
/// carries the JSON document.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
    quiet: bool,
}

impl Printer {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn chatty(&self) -> bool {
        !self.quiet && !self.is_json()
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.chatty() {
            println!("{} {}", style("✓").green().bold(), message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.chatty() {
            println!("{} {}", style("!").yellow().bold(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.chatty() {
            println!("{} {}", style("→").blue(), message);
        }
    }

    /// Print a bold header
    pub fn header(&self, text: &str) {
        if self.chatty() {
            println!("{}", style(text).bold());
        }
    }

    /// Print an indented key-value line
    pub fn key_value(&self, key: &str, value: &str) {
        if self.chatty() {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    /// Print a line that is kept in quiet mode
    pub fn plain(&self, line: &str) {
        if !self.is_json() {
            println!("{}", line);
        }
    }

    /// Print the JSON document of a result in JSON mode
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        if self.is_json() {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }
}
