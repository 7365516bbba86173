//! Discovery through the external tool's own autodiscovery
//!
//! The tool is run once with autodiscovery on and told to write the
//! repositories it found to a file in a scratch directory. The file holds
//! either a JSON list of names or a list of `{"repository", "platform"}`
//! objects.

use crate::discovery::{DiscoveryFilter, Discoverer};
use crate::domain::Repository;
use crate::error::DiscoveryError;
use crate::runner::ToolCommand;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tracing::{debug, info};

/// File name the tool writes discovered repositories to
const DISCOVERED_FILE: &str = "renovate-repos.json";

/// Stderr lines kept in a failure message
const STDERR_TAIL: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepositoryFile {
    Names(Vec<String>),
    Entries(Vec<Repository>),
}

/// Parse the contents of a discovered repositories file
pub fn parse_repository_file(content: &str) -> Result<Vec<Repository>, String> {
    let file: RepositoryFile = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(match file {
        RepositoryFile::Names(names) => names.into_iter().map(Repository::new).collect(),
        RepositoryFile::Entries(entries) => entries,
    })
}

/// Lists repositories by running the external tool in autodiscover mode
pub struct ToolDiscoverer {
    command: ToolCommand,
    platform: String,
    filter: DiscoveryFilter,
}

impl ToolDiscoverer {
    /// Create a new tool discoverer
    pub fn new(command: ToolCommand, platform: impl Into<String>, filter: DiscoveryFilter) -> Self {
        Self {
            command,
            platform: platform.into(),
            filter,
        }
    }

    /// Read the file the tool wrote and apply the name filter
    fn read_discovered(&self, path: &Path) -> Result<Vec<Repository>, DiscoveryError> {
        let invalid = |message: String| DiscoveryError::InvalidRepositoryFile {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let repositories = parse_repository_file(&content).map_err(invalid)?;

        Ok(repositories
            .into_iter()
            .filter(|r| self.filter.matches_name(r.short_name()))
            .map(|r| match r.platform {
                Some(_) => r,
                None => r.with_platform(self.platform.as_str()),
            })
            .collect())
    }
}

#[async_trait]
impl Discoverer for ToolDiscoverer {
    fn name(&self) -> &'static str {
        "tool"
    }

    async fn discover(&self) -> Result<Vec<Repository>, DiscoveryError> {
        let program = self.command.program().to_string();
        let scratch = tempfile::tempdir()
            .map_err(|e| DiscoveryError::tool_failed(&program, format!("temp dir: {}", e)))?;
        let path = scratch.path().join(DISCOVERED_FILE);

        info!(command = %program, "Running autodiscovery");
        let output = self
            .command
            .discovery_invocation(&path)
            .to_command()
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DiscoveryError::tool_failed(&program, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
            let message = if tail.is_empty() {
                format!("exited with {}", output.status)
            } else {
                format!("exited with {}: {}", output.status, tail)
            };
            return Err(DiscoveryError::tool_failed(&program, message));
        }

        let repositories = self.read_discovered(&path)?;
        debug!(count = repositories.len(), "Tool discovered repositories");
        Ok(repositories)
    }
}
