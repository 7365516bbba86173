//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: Issues loading or validating the configuration file
//! - DiscoveryError: Issues listing repositories to process
//! - RunnerError: Issues running the external tool for one repository
//! - NotifyError: Issues delivering a job result to a notifier

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Repository discovery related errors
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// External tool execution errors
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// Notification delivery errors
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// Notifier type is not one of the known transports
    #[error("unknown notifier type '{kind}': expected 'stdout', 'webhook', 'teams', or 'telegram'")]
    UnknownNotifier { kind: String },

    /// A notifier is missing a required field
    #[error("notifier '{kind}' requires '{field}'")]
    MissingNotifierField { kind: String, field: &'static str },

    /// Include/exclude pattern does not compile
    #[error("invalid discovery pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// No repositories were given and discovery is disabled
    #[error("no repositories to process: pass them as arguments or enable [discovery]")]
    NoRepositories,
}

/// Errors related to repository discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Platform has no discovery support
    #[error("unsupported platform for discovery: '{platform}'")]
    UnsupportedPlatform { platform: String },

    /// Platform API request failed
    #[error("failed to list repositories from {platform}: {message}")]
    ApiError { platform: String, message: String },

    /// The external tool failed during its discovery run
    #[error("discovery run of '{command}' failed: {message}")]
    ToolFailed { command: String, message: String },

    /// The discovered repositories file could not be read or parsed
    #[error("failed to read discovered repositories from {path}: {message}")]
    InvalidRepositoryFile { path: PathBuf, message: String },
}

/// Errors related to running the external tool for a single repository
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The executable could not be started
    #[error("failed to start '{command}': {message}")]
    Spawn { command: String, message: String },

    /// A stdout/stderr pipe could not be opened
    #[error("failed to open {stream} pipe")]
    Pipe { stream: &'static str },

    /// The process exited with a non-zero status
    #[error("'{command}' exited with {status}")]
    NonZeroExit { command: String, status: String },

    /// Waiting on the process failed
    #[error("failed to wait for '{command}': {message}")]
    Wait { command: String, message: String },

    /// The job was cancelled before the process finished
    #[error("job cancelled before '{command}' finished")]
    Cancelled { command: String },

    /// The job task panicked
    #[error("job task panicked: {message}")]
    Panicked { message: String },
}

/// Errors related to notification delivery
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Payload could not be serialized
    #[error("failed to marshal {notifier} payload: {message}")]
    Marshal { notifier: String, message: String },

    /// Request could not be sent
    #[error("failed to send {notifier} notification: {message}")]
    Network { notifier: String, message: String },

    /// Remote end answered with an error status
    #[error("{notifier} notification failed with status code: {status}")]
    Status { notifier: String, status: u16 },

    /// Writing to the local console failed
    #[error("failed to write {notifier} notification: {source}")]
    Io {
        notifier: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidPattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl DiscoveryError {
    /// Creates a new ApiError
    pub fn api_error(platform: impl Into<String>, message: impl Into<String>) -> Self {
        DiscoveryError::ApiError {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Creates a new ToolFailed error
    pub fn tool_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        DiscoveryError::ToolFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl RunnerError {
    /// Creates a new Spawn error
    pub fn spawn(command: impl Into<String>, source: &std::io::Error) -> Self {
        RunnerError::Spawn {
            command: command.into(),
            message: source.to_string(),
        }
    }

    /// Creates a new NonZeroExit error
    pub fn non_zero_exit(command: impl Into<String>, status: std::process::ExitStatus) -> Self {
        RunnerError::NonZeroExit {
            command: command.into(),
            status: status.to_string(),
        }
    }

    /// Creates a new Cancelled error
    pub fn cancelled(command: impl Into<String>) -> Self {
        RunnerError::Cancelled {
            command: command.into(),
        }
    }

    /// Returns true if the process never produced any output because it was not started
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, RunnerError::Spawn { .. } | RunnerError::Pipe { .. })
    }
}

impl NotifyError {
    /// Creates a new Network error
    pub fn network(notifier: impl Into<String>, message: impl Into<String>) -> Self {
        NotifyError::Network {
            notifier: notifier.into(),
            message: message.into(),
        }
    }

    /// Creates a new Status error
    pub fn status(notifier: impl Into<String>, status: u16) -> Self {
        NotifyError::Status {
            notifier: notifier.into(),
            status,
        }
    }
}
