//! Core domain models for renovates
//!
//! This module contains the fundamental types used throughout the application:
//! - Repository identities produced by discovery
//! - Captured, line-tagged output of a single tool run
//! - Dependency update records extracted from that output
//! - Per-job results consumed by notifiers and the final report

mod job_result;
mod raw_output;
mod repository;
mod update_info;

pub use job_result::{BatchReport, JobResult};
pub use raw_output::{OutputLine, RawOutput, StreamOrigin};
pub use repository::Repository;
pub use update_info::{UpdateInfo, UpdateKey};
