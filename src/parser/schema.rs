//! Structured log record shapes emitted by the external tool
//!
//! The tool has changed its log schema over time and a deployment may mix
//! versions, so every line is classified independently:
//! - Flat: update fields directly on the record
//! - Branch upgrades: `"branches info extended"` with branches holding upgrades
//! - Package files: `"packageFiles with updates"` with manager → files → deps → updates

use crate::domain::UpdateInfo;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Marker message of the branch-upgrade shape
pub const BRANCHES_INFO_MSG: &str = "branches info extended";

/// Marker message of the package-file shape
pub const PACKAGE_FILES_MSG: &str = "packageFiles with updates";

/// One recognized log record
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    /// A record carrying the update fields directly
    Flat(FlatRecord),
    /// Branches, each with a list of upgrades
    BranchUpgrades(Vec<BranchInfo>),
    /// Package files grouped by manager name
    PackageFiles(BTreeMap<String, Vec<PackageFile>>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub dep_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub new_version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub update_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub branch_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upgrades: Vec<FlatRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_file: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deps: Vec<PackageFileDep>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFileDep {
    #[serde(default, deserialize_with = "lenient_string")]
    pub dep_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updates: Vec<PackageFileUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFileUpdate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub new_version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub update_type: String,
}

/// Accepts strings, numbers and null for a string field
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl LogRecord {
    /// Classifies a single log line, returning `None` for anything unrecognized
    pub fn detect(line: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(line).ok()?;
        let object = value.as_object()?;

        let tagged = match object.get("msg").and_then(Value::as_str) {
            Some(BRANCHES_INFO_MSG) => object
                .get("branchesInformation")
                .and_then(|v| Vec::<BranchInfo>::deserialize(v).ok())
                .filter(|branches| !branches.is_empty())
                .map(LogRecord::BranchUpgrades),
            Some(PACKAGE_FILES_MSG) => object
                .get("config")
                .and_then(|v| BTreeMap::<String, Vec<PackageFile>>::deserialize(v).ok())
                .filter(|managers| !managers.is_empty())
                .map(LogRecord::PackageFiles),
            _ => None,
        };

        tagged.or_else(|| {
            FlatRecord::deserialize(&value)
                .ok()
                .filter(FlatRecord::is_update)
                .map(LogRecord::Flat)
        })
    }

    /// Expands the record into update records, in record order
    pub fn into_updates(self) -> Vec<UpdateInfo> {
        match self {
            LogRecord::Flat(record) => vec![record.into()],
            LogRecord::BranchUpgrades(branches) => branches
                .into_iter()
                .flat_map(|branch| branch.upgrades)
                .map(UpdateInfo::from)
                .collect(),
            LogRecord::PackageFiles(managers) => {
                let mut updates = Vec::new();
                for file in managers.into_values().flatten() {
                    for dep in file.deps {
                        for update in dep.updates {
                            updates.push(UpdateInfo {
                                dep_name: dep.dep_name.clone(),
                                current_version: dep.current_version.clone(),
                                new_version: update.new_version,
                                update_type: update.update_type,
                                package_file: file.package_file.clone(),
                            });
                        }
                    }
                }
                updates
            }
        }
    }
}

impl FlatRecord {
    /// A flat record only counts when it names a dependency and a target version
    pub fn is_update(&self) -> bool {
        !self.dep_name.is_empty() && !self.new_version.is_empty()
    }
}

impl From<FlatRecord> for UpdateInfo {
    fn from(record: FlatRecord) -> Self {
        UpdateInfo {
            dep_name: record.dep_name,
            current_version: record.current_version,
            new_version: record.new_version,
            update_type: record.update_type,
            package_file: record.package_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_flat() {
        let record = LogRecord::detect(
            r#"{"depName":"left-pad","newVersion":"1.0.1","currentVersion":"1.0.0","updateType":"patch"}"#,
        );
        match record {
            Some(LogRecord::Flat(flat)) => {
                assert_eq!(flat.dep_name, "left-pad");
                assert_eq!(flat.new_version, "1.0.1");
                assert!(flat.package_file.is_empty());
            }
            other => panic!("Expected Flat record, got {:?}", other),
        }
    }

    #[test]
    fn test_detect_flat_requires_dep_name_and_new_version() {
        assert!(LogRecord::detect(r#"{"depName":"left-pad","currentVersion":"1.0.0"}"#).is_none());
        assert!(LogRecord::detect(r#"{"depName":"","newVersion":"1.0.1"}"#).is_none());
        assert!(LogRecord::detect(r#"{"newVersion":"1.0.1"}"#).is_none());
    }

    #[test]
    fn test_detect_flat_tolerates_odd_field_types() {
        let record =
            LogRecord::detect(r#"{"depName":"go","newVersion":1.22,"currentVersion":null,"updateType":"minor"}"#);
        let updates = record.unwrap().into_updates();
        assert_eq!(updates[0].new_version, "1.22");
        assert_eq!(updates[0].current_version, "");
    }

    #[test]
    fn test_detect_branch_upgrades() {
        let line = r#"{"msg":"branches info extended","branchesInformation":[{"branchName":"renovate/deps","upgrades":[{"depName":"depB","currentVersion":"1.0.0","newVersion":"1.1.0","updateType":"minor","packageFile":"package.json"},{"depName":"depA","currentVersion":"2.0.0","newVersion":"3.0.0","updateType":"major","packageFile":"package.json"}]}]}"#;
        let updates = LogRecord::detect(line).unwrap().into_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].dep_name, "depB");
        assert_eq!(updates[1].dep_name, "depA");
        assert_eq!(updates[1].package_file, "package.json");
    }

    #[test]
    fn test_detect_branch_marker_without_branches() {
        assert!(LogRecord::detect(r#"{"msg":"branches info extended","branchesInformation":[]}"#).is_none());
        assert!(LogRecord::detect(r#"{"msg":"branches info extended"}"#).is_none());
    }

    #[test]
    fn test_detect_package_files() {
        let line = r#"{"msg":"packageFiles with updates","config":{"npm":[{"packageFile":"package.json","deps":[{"depName":"react","currentVersion":"18.0.0","updates":[{"newVersion":"18.2.0","updateType":"minor"},{"newVersion":"19.0.0","updateType":"major"}]},{"depName":"lodash","currentVersion":"4.17.21","updates":[]}]}]}}"#;
        let updates = LogRecord::detect(line).unwrap().into_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].current_version, "18.0.0");
        assert_eq!(updates[0].new_version, "18.2.0");
        assert_eq!(updates[1].update_type, "major");
        assert!(updates.iter().all(|u| u.package_file == "package.json"));
    }

    #[test]
    fn test_detect_package_files_with_unrelated_config_shape() {
        // Other log lines reuse the `config` key with arbitrary content
        let line = r#"{"msg":"packageFiles with updates","config":{"npm":{"enabled":true}}}"#;
        assert!(LogRecord::detect(line).is_none());
    }

    #[test]
    fn test_detect_rejects_non_objects() {
        assert!(LogRecord::detect("not json at all").is_none());
        assert!(LogRecord::detect(r#"["depName","newVersion"]"#).is_none());
        assert!(LogRecord::detect(r#"{"depName":"x","newVersion":"#).is_none());
    }
}
