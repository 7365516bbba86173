//! Configuration file loading
//!
//! Reads `config.toml` (or the file given with `--config`), applies the
//! `RENOVATE_CMD` and `WEBHOOK_URL` environment overrides and validates the
//! result before anything is run.

use crate::discovery::DiscoveryFilter;
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Default external tool executable
pub const DEFAULT_COMMAND: &str = "renovate";

/// Default number of repositories processed at once
pub const DEFAULT_CONCURRENCY: i64 = 2;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool executable path or name
    pub command: String,
    /// Arguments placed before the repository argument
    pub command_args: Vec<String>,
    /// Platform the repositories live on (github, gitlab, ...)
    pub platform: String,
    /// Authentication token for the platform
    pub token: String,
    /// Platform API endpoint
    pub endpoint: String,
    /// Log level forwarded to the tool
    pub log_level: String,
    /// Run the tool without creating branches or pull requests
    pub dry_run: bool,
    /// Override for the tool's onboarding behavior
    pub onboarding: Option<bool>,
    /// Override for the tool's require-config behavior
    pub require_config: Option<String>,
    /// Webhook URL forwarded to the tool itself
    pub webhook: String,
    /// Extra environment forwarded verbatim to every tool run
    pub extra_env: BTreeMap<String, String>,
    /// Maximum number of concurrent jobs; values below 1 mean 1
    pub concurrency: i64,
    /// Per-job deadline in seconds, none by default
    pub job_timeout_secs: Option<u64>,
    /// Where job results are delivered
    pub notifiers: Vec<NotifierConfig>,
    /// How repositories are discovered when none are given on the command line
    pub discovery: DiscoveryConfig,
}

/// One notifier entry (`[[notifiers]]`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Transport: stdout, webhook, teams or telegram
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub token: String,
    pub chat_id: String,
}

/// Repository discovery settings (`[discovery]`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub enabled: bool,
    /// Where the repository list comes from
    pub source: DiscoverySource,
    /// Only list repositories of this user, organization or group
    pub owner: String,
    /// Keep repositories carrying any of these topics
    pub topics: Vec<String>,
    /// Keep repositories whose name matches any of these patterns
    pub includes: Vec<String>,
    /// Drop repositories whose name matches any of these patterns
    pub excludes: Vec<String>,
}

/// Source of discovered repositories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    /// Platform REST API
    #[default]
    Api,
    /// The external tool's own autodiscovery
    Tool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            command_args: Vec::new(),
            platform: String::new(),
            token: String::new(),
            endpoint: String::new(),
            log_level: String::new(),
            dry_run: false,
            onboarding: None,
            require_config: None,
            webhook: String::new(),
            extra_env: BTreeMap::new(),
            concurrency: DEFAULT_CONCURRENCY,
            job_timeout_secs: None,
            notifiers: Vec::new(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Config {
    /// Load, override from the process environment, and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let mut config = Self::from_toml_str(&content, path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults
    ///
    /// Only used for the default path; an explicitly given file must exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::toml_parse_error(path, e.to_string()))
    }

    /// Apply `RENOVATE_CMD` and `WEBHOOK_URL`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(command) = lookup("RENOVATE_CMD").filter(|c| !c.is_empty()) {
            self.command = command;
        }
        if let Some(url) = lookup("WEBHOOK_URL").filter(|u| !u.is_empty()) {
            let already_configured = self
                .notifiers
                .iter()
                .any(|n| n.kind == "webhook" && n.url == url);
            if !already_configured {
                self.notifiers.push(NotifierConfig {
                    kind: "webhook".to_string(),
                    url,
                    ..NotifierConfig::default()
                });
            }
        }
    }

    /// Check notifier entries and discovery patterns
    pub fn validate(&self) -> Result<(), ConfigError> {
        for notifier in &self.notifiers {
            notifier.validate()?;
        }
        DiscoveryFilter::from_config(&self.discovery)?;
        Ok(())
    }

    /// Concurrency clamped to `1..=Semaphore::MAX_PERMITS`
    pub fn effective_concurrency(&self) -> usize {
        let ceiling = i64::try_from(Semaphore::MAX_PERMITS).unwrap_or(i64::MAX);
        self.concurrency.clamp(1, ceiling) as usize
    }

    /// Per-job deadline, if configured
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// Environment shared by every tool invocation
    ///
    /// Repository selection variables and `extra_env` are added by the runner.
    pub fn tool_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        let mut set = |key: &str, value: &str| {
            if !value.is_empty() {
                env.push((key.to_string(), value.to_string()));
            }
        };

        set("RENOVATE_PLATFORM", &self.platform);
        set("RENOVATE_TOKEN", &self.token);
        set("RENOVATE_ENDPOINT", &self.endpoint);
        set("LOG_LEVEL", &self.log_level);
        if self.dry_run {
            set("RENOVATE_DRY_RUN", "true");
        }
        set("RENOVATE_WEBHOOK", &self.webhook);
        if let Some(onboarding) = self.onboarding {
            set("RENOVATE_ONBOARDING", if onboarding { "true" } else { "false" });
        }
        if let Some(require_config) = &self.require_config {
            set("RENOVATE_REQUIRE_CONFIG", require_config);
        }
        set("LOG_FORMAT", "json");

        env
    }
}

impl NotifierConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let missing = |field: &'static str| ConfigError::MissingNotifierField {
            kind: self.kind.clone(),
            field,
        };

        match self.kind.as_str() {
            "stdout" => Ok(()),
            "webhook" | "teams" if self.url.is_empty() => Err(missing("url")),
            "webhook" | "teams" => Ok(()),
            "telegram" if self.token.is_empty() => Err(missing("token")),
            "telegram" if self.chat_id.is_empty() => Err(missing("chat_id")),
            "telegram" => Ok(()),
            _ => Err(ConfigError::UnknownNotifier {
                kind: self.kind.clone(),
            }),
        }
    }
}
