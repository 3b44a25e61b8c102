use crate::utils::{DEFAULT_MIGRATIONS_DIR, DEFAULT_RESULTS_COLLECTION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Default location of the file-backed document store
pub const DEFAULT_STORE_PATH: &str = "./docway-store.json";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

fn default_source_directory() -> PathBuf {
    PathBuf::from(DEFAULT_MIGRATIONS_DIR)
}

fn default_results_collection() -> String {
    DEFAULT_RESULTS_COLLECTION.to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Migration run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateConfig {
    /// Directory holding the migration files
    #[serde(default = "default_source_directory")]
    pub source_directory: PathBuf,
    /// Collection receiving one result record per migration
    #[serde(default = "default_results_collection")]
    pub results_collection: String,
    /// Run scripts without persisting any write
    #[serde(default)]
    pub dry_run: bool,
    /// Recorded as `installed_by`; defaults to the OS user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_by: Option<String>,
    /// Project identifier handed to scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// JSON file used by the file-backed store
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// One of debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            source_directory: default_source_directory(),
            results_collection: default_results_collection(),
            dry_run: false,
            installed_by: None,
            project_id: None,
            store_path: default_store_path(),
            log_level: default_log_level(),
        }
    }
}

impl MigrateConfig {
    pub fn new(source_directory: impl Into<PathBuf>) -> Self {
        Self {
            source_directory: source_directory.into(),
            ..Default::default()
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_results_collection(mut self, collection: impl Into<String>) -> Self {
        self.results_collection = collection.into();
        self
    }

    pub fn with_installed_by(mut self, installed_by: impl Into<String>) -> Self {
        self.installed_by = Some(installed_by.into());
        self
    }

    /// Check the log level against the supported names
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.to_lowercase().as_str() {
            "debug" | "info" | "warn" | "error" | "trace" => Ok(()),
            other => Err(ConfigError::InvalidLogLevel(other.to_string())),
        }
    }
}

/// Read a configuration file, returning `None` when it does not exist
pub async fn read_config(config_path: &Path) -> Result<Option<MigrateConfig>, ConfigError> {
    if !fs::try_exists(config_path).await.unwrap_or(false) {
        return Ok(None);
    }

    let content = fs::read_to_string(config_path).await?;
    let config: MigrateConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(Some(config))
}

/// Write a configuration file
pub async fn write_config(config_path: &Path, config: &MigrateConfig) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(config_path, content).await?;
    Ok(())
}
