//! Repository discovery
//!
//! This module provides:
//! - GitHub REST API listing
//! - GitLab REST API listing
//! - The external tool's own autodiscovery
//! - Topic and name filtering shared by all sources

mod filter;
mod github;
mod gitlab;
mod tool;

pub use filter::DiscoveryFilter;
pub use github::GitHubDiscoverer;
pub use gitlab::GitLabDiscoverer;
pub use tool::{parse_repository_file, ToolDiscoverer};

use crate::config::{Config, DiscoverySource};
use crate::domain::Repository;
use crate::error::{AppError, DiscoveryError};
use crate::http::HttpClient;
use crate::runner::ToolCommand;
use async_trait::async_trait;

/// Trait for repository discovery sources
#[async_trait]
pub trait Discoverer: Send + Sync {
    /// Get the source name used in logs
    fn name(&self) -> &'static str;

    /// List the repositories to process
    async fn discover(&self) -> Result<Vec<Repository>, DiscoveryError>;
}

/// Create the discoverer selected by the configuration
pub fn create_discoverer(config: &Config, client: HttpClient) -> Result<Box<dyn Discoverer>, AppError> {
    let discovery = &config.discovery;
    let filter = DiscoveryFilter::from_config(discovery)?;

    if discovery.source == DiscoverySource::Tool {
        return Ok(Box::new(ToolDiscoverer::new(
            ToolCommand::from_config(config),
            config.platform.clone(),
            filter,
        )));
    }

    match config.platform.to_lowercase().as_str() {
        "github" => Ok(Box::new(GitHubDiscoverer::new(
            client,
            &config.endpoint,
            config.token.clone(),
            discovery.owner.clone(),
            filter,
        ))),
        "gitlab" => Ok(Box::new(GitLabDiscoverer::new(
            client,
            &config.endpoint,
            config.token.clone(),
            discovery.owner.clone(),
            filter,
        ))),
        other => Err(DiscoveryError::UnsupportedPlatform {
            platform: other.to_string(),
        }
        .into()),
    }
}
