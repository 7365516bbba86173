//! Job result types
//!
//! Provides structures for tracking the outcome of each repository job and of
//! the whole batch.

use super::{RawOutput, Repository, UpdateInfo};
use crate::error::RunnerError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Outcome of running the external tool against one repository
///
/// Created once per job when it completes and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// The repository the job ran against
    pub repository: Repository,
    /// Whether the tool ran and exited successfully
    pub success: bool,
    /// Everything the tool printed, kept for diagnostics
    #[serde(skip)]
    pub raw_output: RawOutput,
    /// Updates extracted from the output, even when the run failed
    pub updates: Vec<UpdateInfo>,
    /// Why the run failed, if it did
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<RunnerError>,
    /// When the job started
    pub started_at: DateTime<Utc>,
    /// Wall time of the job
    #[serde(rename = "durationMs", serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

fn serialize_error<S: Serializer>(
    error: &Option<RunnerError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

fn serialize_duration_ms<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl JobResult {
    /// Returns the number of updates found
    pub fn update_count(&self) -> usize {
        self.updates.len()
    }

    /// Returns true if any updates were found
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    /// Returns a one-word status label
    pub fn status_label(&self) -> &'static str {
        if self.success {
            "SUCCESS"
        } else {
            "FAILURE"
        }
    }
}

/// Results of a whole batch, in input order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// One result per scheduled repository
    pub results: Vec<JobResult>,
    /// Whether the tool ran in dry-run mode
    pub dry_run: bool,
}

impl BatchReport {
    /// Creates a new report
    pub fn new(results: Vec<JobResult>, dry_run: bool) -> Self {
        Self { results, dry_run }
    }

    /// Returns the number of jobs
    pub fn total_jobs(&self) -> usize {
        self.results.len()
    }

    /// Returns the number of successful jobs
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Returns the number of failed jobs
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    /// Returns the total number of updates over all repositories
    pub fn total_updates(&self) -> usize {
        self.results.iter().map(|r| r.update_count()).sum()
    }

    /// Returns the failed jobs
    pub fn failures(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Returns true if every job succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}
