#![allow(dead_code)]

use docway::{
    DeclarativeLoader, FsMigrationSource, MemoryStore, MigrateConfig, MigrationExecutor,
    ScriptLoader,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Collection used for migration results in tests
pub const RESULTS: &str = "migrations";

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write a declarative migration file built from a list of operations
pub async fn write_migration(dir: &Path, filename: &str, operations: Value) {
    let content = serde_json::json!({ "operations": operations });
    tokio::fs::write(
        dir.join(filename),
        serde_json::to_string_pretty(&content).expect("Failed to serialize migration"),
    )
    .await
    .expect("Failed to write migration file");
}

/// Write a raw file into the migrations directory
pub async fn write_raw(dir: &Path, filename: &str, content: &str) {
    tokio::fs::write(dir.join(filename), content)
        .await
        .expect("Failed to write file");
}

/// Executor over the local file system and an in-memory store
pub fn memory_executor(store: &Arc<MemoryStore>) -> MigrationExecutor {
    executor_with_loader(store, Arc::new(DeclarativeLoader::new()))
}

/// Executor over the local file system with a custom loader
pub fn executor_with_loader(
    store: &Arc<MemoryStore>,
    loader: Arc<dyn ScriptLoader>,
) -> MigrationExecutor {
    MigrationExecutor::new(
        Arc::new(FsMigrationSource::new()),
        loader,
        Arc::clone(store) as Arc<dyn docway::DocumentStore>,
    )
}

/// Run configuration pointing at a test directory
pub fn config_for(dir: &Path) -> MigrateConfig {
    MigrateConfig::new(dir).with_installed_by("tester")
}
