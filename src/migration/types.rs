//! Types for the migration system.

use crate::intercept::{Database, WriteCounts};
use crate::store::StoreError;
use crate::version::VersionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Error types for migration operations.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("No directory at {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("{0}")]
    VersionError(#[from] VersionError),

    #[error("Both {second} and {first} have the same version")]
    DuplicateVersion { first: String, second: String },

    #[error("Failed to load {script}: {source}")]
    ScriptLoad {
        script: String,
        #[source]
        source: LoadError,
    },

    #[error("Migration to version {version} using {script} failed! Please restore backups and roll back database and code!")]
    UnresolvedPriorFailure { version: String, script: String },

    #[error("Stopped at first failure: {script} (version {version})")]
    ExecutionHalted { version: String, script: String },
}

/// Error returned by a script loader.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid migration script: {0}")]
    InvalidScript(String),

    #[error("No migration script registered for {0}")]
    NotRegistered(String),

    #[error("Unsupported migration type: {0}")]
    UnsupportedType(String),
}

/// Application handle passed to scripts alongside the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppHandle {
    /// Name of the application running the migrations.
    pub name: String,
    /// Identifier of the target project, when known.
    pub project_id: Option<String>,
}

/// Everything a migration script receives.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    pub db: Database,
    pub app: AppHandle,
    pub dry_run: bool,
}

/// A loaded, invocable migration.
#[async_trait]
pub trait MigrationScript: Send + Sync {
    /// Apply the migration. Any error marks the attempt as failed.
    async fn migrate(&self, ctx: &MigrationContext) -> anyhow::Result<()>;
}

/// Persisted record of one execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub installed_rank: i64,
    pub description: String,
    pub version: String,
    pub script: String,
    #[serde(rename = "type")]
    pub script_type: String,
    pub checksum: String,
    pub installed_by: String,
    pub installed_on: DateTime<Utc>,
    /// Milliseconds spent in the script.
    pub execution_time: u64,
    pub success: bool,
}

impl MigrationResult {
    /// Document id of this record: `v<version>__<description>`.
    pub fn record_id(&self) -> String {
        record_id(&self.version, &self.description)
    }
}

/// Document id for a version/description pair.
pub fn record_id(version: &str, description: &str) -> String {
    format!("v{}__{}", version, description)
}

/// Aggregate statistics of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub scanned_files: usize,
    pub executed_files: usize,
    pub created: u64,
    pub set: u64,
    pub updated: u64,
    pub deleted: u64,
    pub added: u64,
}

impl RunStatistics {
    pub fn new(scanned_files: usize, executed_files: usize, counts: WriteCounts) -> Self {
        Self {
            scanned_files,
            executed_files,
            created: counts.created,
            set: counts.set,
            updated: counts.updated,
            deleted: counts.deleted,
            added: counts.added,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id() {
        assert_eq!(record_id("0.1.0", "second"), "v0.1.0__second");
    }

    #[test]
    fn test_result_field_names() {
        let result = MigrationResult {
            installed_rank: 0,
            description: "first".to_string(),
            version: "0.0.0".to_string(),
            script: "v0__first.json".to_string(),
            script_type: "json".to_string(),
            checksum: "abc".to_string(),
            installed_by: "len".to_string(),
            installed_on: Utc::now(),
            execution_time: 12,
            success: true,
        };

        let value = serde_json::to_value(&result).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "checksum",
                "description",
                "execution_time",
                "installed_by",
                "installed_on",
                "installed_rank",
                "script",
                "success",
                "type",
                "version",
            ]
        );
        assert_eq!(object["type"], json!("json"));

        let back: MigrationResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_statistics_serialize_camel_case() {
        let stats = RunStatistics::new(
            2,
            1,
            WriteCounts {
                set: 1,
                ..Default::default()
            },
        );
        let value = serde_json::to_value(stats).unwrap();
        assert_eq!(
            value,
            json!({
                "scannedFiles": 2,
                "executedFiles": 1,
                "created": 0,
                "set": 1,
                "updated": 0,
                "deleted": 0,
                "added": 0
            })
        );
    }
}
