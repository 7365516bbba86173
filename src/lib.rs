//! renovates - Run Renovate across many repositories
//!
//! This library provides the pieces of the batch:
//! - Repository discovery (GitHub, GitLab, or Renovate's own autodiscovery)
//! - A bounded-concurrency dispatcher running one Renovate process per repository
//! - A parser turning Renovate's JSON logs into dependency update records
//! - Notification fan-out (stdout, webhook, Teams, Telegram)

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod http;
pub mod notifier;
pub mod output;
pub mod parser;
pub mod progress;
pub mod runner;
