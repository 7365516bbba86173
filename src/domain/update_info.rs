//! Dependency update records

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single dependency version bump reported by the external tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    /// Dependency name
    pub dep_name: String,
    /// Version currently in use
    pub current_version: String,
    /// Version the dependency would be bumped to
    pub new_version: String,
    /// Kind of update (major, minor, patch, digest, ...)
    pub update_type: String,
    /// Manifest the dependency was found in, empty when unknown
    pub package_file: String,
}

/// Identity of an update record
///
/// Field order is the output sort order: dependency name, then new version.
/// The package file only separates otherwise equal keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UpdateKey {
    pub dep_name: String,
    pub new_version: String,
    pub package_file: String,
}

impl UpdateInfo {
    /// Creates a new update record
    pub fn new(
        dep_name: impl Into<String>,
        current_version: impl Into<String>,
        new_version: impl Into<String>,
        update_type: impl Into<String>,
    ) -> Self {
        Self {
            dep_name: dep_name.into(),
            current_version: current_version.into(),
            new_version: new_version.into(),
            update_type: update_type.into(),
            package_file: String::new(),
        }
    }

    /// Sets the package file (builder pattern)
    pub fn in_package_file(mut self, package_file: impl Into<String>) -> Self {
        self.package_file = package_file.into();
        self
    }

    /// Returns the identity key used for deduplication
    pub fn key(&self) -> UpdateKey {
        UpdateKey {
            dep_name: self.dep_name.clone(),
            new_version: self.new_version.clone(),
            package_file: self.package_file.clone(),
        }
    }
}

impl fmt::Display for UpdateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.dep_name, self.current_version, self.new_version
        )?;
        if !self.package_file.is_empty() {
            write!(f, " ({})", self.package_file)?;
        }
        if !self.update_type.is_empty() {
            write!(f, " [{}]", self.update_type)?;
        }
        Ok(())
    }
}
