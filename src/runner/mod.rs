//! Process runner for the external tool
//!
//! This module provides:
//! - Invocation building (arguments and environment per run mode)
//! - A runner that streams stdout and stderr concurrently into one sink
//! - The `ProcessRunner` seam the dispatcher depends on, so tests can
//!   substitute a fake

mod command;
mod process;

pub use command::{Invocation, ToolCommand};
pub use process::ToolRunner;

use crate::domain::{RawOutput, Repository};
use crate::error::RunnerError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// What a single run produced
///
/// The output is returned even when the run failed, as far as it was captured.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub output: RawOutput,
    pub error: Option<RunnerError>,
}

impl RunOutcome {
    /// A run that exited successfully
    pub fn succeeded(output: RawOutput) -> Self {
        Self {
            output,
            error: None,
        }
    }

    /// A run that failed after capturing `output`
    pub fn failed(output: RawOutput, error: RunnerError) -> Self {
        Self {
            output,
            error: Some(error),
        }
    }

    /// Returns true if the run succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Trait for running the external tool against one repository
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, or until `cancel` fires
    async fn run(&self, repository: &Repository, cancel: CancellationToken) -> RunOutcome;
}
