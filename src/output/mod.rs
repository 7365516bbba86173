//! Output formatting for batch results
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::{TextFormatter, UpdateKind};

use crate::domain::{BatchReport, JobResult};
use std::io::Write;

/// Report rendering: text for people, JSON for pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// How much of each job is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Summary and failures only
    Quiet,
    /// One block per repository
    #[default]
    Normal,
    /// Adds the captured tool output of failed jobs
    Verbose,
}

/// Settings for the end-of-batch report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Draw status symbols and colors instead of plain `[STATUS]` tags
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            verbosity: Verbosity::Normal,
            color: true,
        }
    }
}

impl OutputConfig {
    /// Build from the `--json`, `--verbose` and `--quiet` flags
    ///
    /// `--quiet` wins over `--verbose`.
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };

        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            verbosity,
            ..Self::default()
        }
    }

    /// Enable or disable colored text (builder pattern)
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Color only when writing to a terminal and `NO_COLOR` is unset
    pub fn detect_color(is_terminal: bool, no_color: Option<&str>) -> bool {
        is_terminal && no_color.is_none_or(str::is_empty)
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write the whole batch report
    fn format(&self, report: &BatchReport, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format and write a single job result
    fn format_job(&self, result: &JobResult, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}
