//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-repository status lines with colors
//! - Update type indication (major/minor/patch) as reported by the tool
//! - Failure details, with captured stderr in verbose mode
//! - Summary with update type breakdown

use crate::domain::{BatchReport, JobResult, UpdateInfo};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Stderr lines shown for a failed job in verbose mode
const STDERR_TAIL: usize = 10;

/// Update type as reported by the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Anything else (digest, pin, lockFileMaintenance, ...) or missing
    Other,
}

impl UpdateKind {
    /// Classify the tool's `updateType` string
    pub fn from_update_type(update_type: &str) -> Self {
        match update_type {
            "major" => UpdateKind::Major,
            "minor" => UpdateKind::Minor,
            "patch" => UpdateKind::Patch,
            _ => UpdateKind::Other,
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self, update_type: &str) -> String {
        match self {
            UpdateKind::Major => "major".red().bold().to_string(),
            UpdateKind::Minor => "minor".yellow().to_string(),
            UpdateKind::Patch => "patch".green().to_string(),
            UpdateKind::Other if update_type.is_empty() => "?".dimmed().to_string(),
            UpdateKind::Other => update_type.dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(update_type: &str) -> &str {
        if update_type.is_empty() {
            "?"
        } else {
            update_type
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn dry_run_prefix(&self, dry_run: bool) -> String {
        match (dry_run, self.color) {
            (false, _) => String::new(),
            (true, true) => format!("{} ", "(dry-run)".cyan()),
            (true, false) => "(dry-run) ".to_string(),
        }
    }

    /// Calculate the maximum dependency name length for alignment
    fn max_name_length(updates: &[UpdateInfo]) -> usize {
        updates.iter().map(|u| u.dep_name.len()).max().unwrap_or(0)
    }

    /// Format a single update line
    fn format_update_line(
        &self,
        update: &UpdateInfo,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let kind = UpdateKind::from_update_type(&update.update_type);
        let file_display = if update.package_file.is_empty() {
            String::new()
        } else {
            format!(" ({})", update.package_file)
        };

        if self.color {
            let name_display = format!("{:width$}", update.dep_name, width = max_name_len);
            writeln!(
                writer,
                "  {} {} {} {} [{}]{}",
                name_display,
                update.current_version.dimmed(),
                "→".dimmed(),
                update.new_version.bright_white().bold(),
                kind.colored_label(&update.update_type),
                file_display.dimmed()
            )
        } else {
            writeln!(
                writer,
                "  {:width$} {} -> {} [{}]{}",
                update.dep_name,
                update.current_version,
                update.new_version,
                UpdateKind::label(&update.update_type),
                file_display,
                width = max_name_len
            )
        }
    }

    /// Format the header line of one job
    fn format_header(&self, result: &JobResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let count = result.update_count();
        let noun = if count == 1 { "update" } else { "updates" };
        let seconds = result.duration.as_secs_f64();

        if self.color {
            let marker = if result.success {
                "✓".green()
            } else {
                "✗".red()
            };
            writeln!(
                writer,
                "{} {} — {} {} {}",
                marker,
                result.repository.name.bold(),
                count.to_string().green(),
                noun,
                format!("({:.1}s)", seconds).dimmed()
            )
        } else {
            writeln!(
                writer,
                "[{}] {} — {} {} ({:.1}s)",
                result.status_label(),
                result.repository.name,
                count,
                noun,
                seconds
            )
        }
    }

    /// Format the error and, in verbose mode, the end of stderr
    fn format_failure(&self, result: &JobResult, writer: &mut dyn Write) -> std::io::Result<()> {
        if let Some(error) = &result.error {
            if self.color {
                writeln!(writer, "  {} {}", "error:".red().bold(), error)?;
            } else {
                writeln!(writer, "  error: {}", error)?;
            }
        }

        if self.verbosity == Verbosity::Verbose {
            for line in result.raw_output.stderr_tail(STDERR_TAIL) {
                if self.color {
                    writeln!(writer, "    {}", line.dimmed())?;
                } else {
                    writeln!(writer, "    {}", line)?;
                }
            }
        }
        Ok(())
    }

    /// Count updates by kind
    fn count_by_kind(report: &BatchReport) -> (usize, usize, usize, usize) {
        let mut major = 0;
        let mut minor = 0;
        let mut patch = 0;
        let mut other = 0;

        for update in report.results.iter().flat_map(|r| &r.updates) {
            match UpdateKind::from_update_type(&update.update_type) {
                UpdateKind::Major => major += 1,
                UpdateKind::Minor => minor += 1,
                UpdateKind::Patch => patch += 1,
                UpdateKind::Other => other += 1,
            }
        }

        (major, minor, patch, other)
    }

    /// Format the summary block
    fn format_summary(&self, report: &BatchReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix(report.dry_run);
        let updates = report.total_updates();
        let (major, minor, patch, other) = Self::count_by_kind(report);

        let mut parts = Vec::new();
        for (count, label) in [(major, "major"), (minor, "minor"), (patch, "patch"), (other, "other")] {
            if count > 0 {
                parts.push(format!("{} {}", count, label));
            }
        }
        let breakdown = if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        };

        if self.color {
            writeln!(writer, "{}{}:", prefix, "Summary".bold())?;
            writeln!(
                writer,
                "  {} repositories, {} succeeded, {} failed",
                report.total_jobs(),
                report.succeeded().to_string().green(),
                if report.failed() > 0 {
                    report.failed().to_string().red().to_string()
                } else {
                    report.failed().to_string().dimmed().to_string()
                }
            )?;
            writeln!(
                writer,
                "  {} update(s) found{}",
                updates.to_string().green(),
                breakdown
            )
        } else {
            writeln!(writer, "{}Summary:", prefix)?;
            writeln!(
                writer,
                "  {} repositories, {} succeeded, {} failed",
                report.total_jobs(),
                report.succeeded(),
                report.failed()
            )?;
            writeln!(writer, "  {} update(s) found{}", updates, breakdown)
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &BatchReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if report.results.is_empty() {
            writeln!(writer, "No repositories to process")?;
            return Ok(());
        }

        for result in &report.results {
            // In quiet mode, only failed jobs are listed
            if self.verbosity == Verbosity::Quiet && result.success {
                continue;
            }
            self.format_job(result, writer)?;
        }

        self.format_summary(report, writer)
    }

    fn format_job(&self, result: &JobResult, writer: &mut dyn Write) -> std::io::Result<()> {
        self.format_header(result, writer)?;

        if self.verbosity != Verbosity::Quiet {
            let max_name_len = Self::max_name_length(&result.updates).max(20);
            for update in &result.updates {
                self.format_update_line(update, max_name_len, writer)?;
            }
        }

        if !result.success {
            self.format_failure(result, writer)?;
        }

        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OutputLine, RawOutput, Repository};
    use crate::error::RunnerError;
    use chrono::Utc;
    use std::time::Duration;

    fn job(name: &str, updates: Vec<UpdateInfo>, error: Option<RunnerError>) -> JobResult {
        JobResult {
            repository: Repository::new(name),
            success: error.is_none(),
            raw_output: [
                OutputLine::stdout("{}"),
                OutputLine::stderr("first stderr line"),
                OutputLine::stderr("last stderr line"),
            ]
            .into_iter()
            .collect::<RawOutput>(),
            updates,
            error,
            started_at: Utc::now(),
            duration: Duration::from_millis(2500),
        }
    }

    fn report() -> BatchReport {
        BatchReport::new(
            vec![
                job(
                    "owner/web",
                    vec![
                        UpdateInfo::new("react", "17.0.2", "18.2.0", "major")
                            .in_package_file("package.json"),
                        UpdateInfo::new("lodash", "4.17.20", "4.17.21", "patch"),
                    ],
                    None,
                ),
                job("owner/api", vec![], Some(RunnerError::cancelled("renovate"))),
            ],
            false,
        )
    }

    fn render(verbosity: Verbosity, report: &BatchReport) -> String {
        let formatter = TextFormatter::with_color(verbosity, false);
        let mut output = Vec::new();
        formatter.format(report, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_update_kind_from_update_type() {
        assert_eq!(UpdateKind::from_update_type("major"), UpdateKind::Major);
        assert_eq!(UpdateKind::from_update_type("minor"), UpdateKind::Minor);
        assert_eq!(UpdateKind::from_update_type("patch"), UpdateKind::Patch);
        assert_eq!(UpdateKind::from_update_type("digest"), UpdateKind::Other);
        assert_eq!(UpdateKind::label(""), "?");
        assert_eq!(UpdateKind::label("pin"), "pin");
    }

    #[test]
    fn test_format_text_normal() {
        let text = render(Verbosity::Normal, &report());

        assert!(text.contains("[SUCCESS] owner/web — 2 updates (2.5s)"));
        assert!(text.contains("react                17.0.2 -> 18.2.0 [major] (package.json)"));
        assert!(text.contains("lodash               4.17.20 -> 4.17.21 [patch]"));
        assert!(text.contains("[FAILURE] owner/api — 0 updates"));
        assert!(text.contains("error: job cancelled before 'renovate' finished"));
        assert!(!text.contains("last stderr line"));
        assert!(text.contains("2 repositories, 1 succeeded, 1 failed"));
        assert!(text.contains("2 update(s) found (1 major, 1 patch)"));
    }

    #[test]
    fn test_format_text_verbose_shows_stderr_of_failures() {
        let text = render(Verbosity::Verbose, &report());
        assert!(text.contains("    first stderr line\n    last stderr line\n"));
    }

    #[test]
    fn test_format_text_quiet_lists_only_failures() {
        let text = render(Verbosity::Quiet, &report());
        assert!(!text.contains("owner/web"));
        assert!(text.contains("owner/api"));
        assert!(text.contains("Summary:"));
    }

    #[test]
    fn test_format_text_dry_run_prefix() {
        let mut report = report();
        report.dry_run = true;
        let text = render(Verbosity::Normal, &report);
        assert!(text.contains("(dry-run) Summary:"));
    }

    #[test]
    fn test_format_text_empty_batch() {
        let text = render(Verbosity::Normal, &BatchReport::new(vec![], false));
        assert_eq!(text, "No repositories to process\n");
    }

    #[test]
    fn test_format_job_single_update_noun() {
        let formatter = TextFormatter::with_color(Verbosity::Normal, false);
        let mut output = Vec::new();
        formatter
            .format_job(
                &job("owner/one", vec![UpdateInfo::new("a", "1", "2", "")], None),
                &mut output,
            )
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("— 1 update (2.5s)"));
        assert!(text.contains("[?]"));
    }

    #[test]
    fn test_format_text_colored_does_not_panic() {
        let formatter = TextFormatter::new(Verbosity::Verbose);
        let mut output = Vec::new();
        formatter.format(&report(), &mut output).unwrap();
        assert!(!output.is_empty());
    }
}
