//! External tool invocation building
//!
//! Every run inherits the parent environment, then gets the shared settings
//! from the configuration, then the mode-specific switches, then `extra_env`.

use crate::config::Config;
use crate::domain::Repository;
use serde_json::Value;
use std::path::Path;

/// How to invoke the external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    extra_env: Vec<(String, String)>,
}

/// A fully resolved command line and environment for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ToolCommand {
    /// Create a command with no arguments or environment
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            extra_env: Vec::new(),
        }
    }

    /// Build the command described by the configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.command.clone(),
            args: config.command_args.clone(),
            env: config.tool_env(),
            extra_env: config
                .extra_env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Set leading arguments (builder pattern)
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable applied after the mode switches
    pub fn with_extra_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((key.into(), value.into()));
        self
    }

    /// Returns the executable name or path
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Invocation processing a single repository without autodiscovery
    pub fn repository_invocation(&self, repository: &Repository) -> Invocation {
        let mut args = self.args.clone();
        args.push(repository.name.clone());

        let repositories = Value::from(vec![repository.name.clone()]).to_string();
        self.invocation(
            args,
            [
                ("RENOVATE_REPOSITORIES", repositories.as_str()),
                ("RENOVATE_AUTODISCOVER", "false"),
                ("RENOVATE_WRITE_DISCOVERED_REPOS", ""),
            ],
        )
    }

    /// Invocation that autodiscovers repositories and writes them to `output_file`
    pub fn discovery_invocation(&self, output_file: &Path) -> Invocation {
        let output_file = output_file.display().to_string();
        self.invocation(
            self.args.clone(),
            [
                ("RENOVATE_AUTODISCOVER", "true"),
                ("RENOVATE_WRITE_DISCOVERED_REPOS", output_file.as_str()),
            ],
        )
    }

    fn invocation<'a, I>(&self, args: Vec<String>, switches: I) -> Invocation
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut env = self.env.clone();
        env.extend(
            switches
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        env.extend(self.extra_env.iter().cloned());

        Invocation {
            program: self.program.clone(),
            args,
            env,
        }
    }
}

impl Invocation {
    /// Returns the value the child will see for `key`, the last assignment winning
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Build a tokio command; stdio is left to the caller
    pub fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}
