//! Repository identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository the external tool should run against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    /// Identity string, `owner/name` or a platform-qualified slug
    #[serde(rename = "repository")]
    pub name: String,
    /// Platform the repository lives on, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl Repository {
    /// Creates a repository without a platform tag
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: None,
        }
    }

    /// Sets the platform tag (builder pattern)
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        let platform = platform.into();
        self.platform = if platform.is_empty() {
            None
        } else {
            Some(platform)
        };
        self
    }

    /// Returns the short name, i.e. the last path segment of the identity
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Repository {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
