//! Turning migration files into invocable scripts.

use super::types::{LoadError, MigrationScript};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Resolves a migration file to the script that implements it.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Arc<dyn MigrationScript>, LoadError>;
}

/// File name component of a path, for lookups and error messages.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
