//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the batch report
//! - Per-repository results, with captured tool output in verbose mode

use crate::domain::{BatchReport, JobResult, OutputLine};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    dry_run: bool,
    summary: JsonSummary,
    results: Vec<JsonJob<'a>>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    repositories: usize,
    succeeded: usize,
    failed: usize,
    updates: usize,
}

/// A job result, optionally with the raw tool output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonJob<'a> {
    #[serde(flatten)]
    result: &'a JobResult,
    /// Only in verbose mode
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a [OutputLine]>,
}

impl JsonFormatter {
    fn job_to_json<'a>(&self, result: &'a JobResult) -> JsonJob<'a> {
        JsonJob {
            result,
            output: (self.verbosity == Verbosity::Verbose).then(|| result.raw_output.lines()),
        }
    }

    fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &BatchReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonOutput {
            dry_run: report.dry_run,
            summary: JsonSummary {
                repositories: report.total_jobs(),
                succeeded: report.succeeded(),
                failed: report.failed(),
                updates: report.total_updates(),
            },
            results: report.results.iter().map(|r| self.job_to_json(r)).collect(),
        };

        Self::write_json(&output, writer)
    }

    fn format_job(&self, result: &JobResult, writer: &mut dyn Write) -> std::io::Result<()> {
        Self::write_json(&self.job_to_json(result), writer)
    }
}
