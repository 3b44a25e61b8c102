//! Registry of migration scripts compiled into the host binary.

use super::loader::{file_name, ScriptLoader};
use super::types::{LoadError, MigrationContext, MigrationScript};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Loader backed by scripts registered in code.
///
/// The migration file on disk still drives discovery, ordering and the
/// checksum; the registry supplies the behavior for each file name.
pub struct ScriptRegistry {
    scripts: HashMap<String, Arc<dyn MigrationScript>>,
}

impl ScriptRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
        }
    }

    /// Register a script for a migration file name (e.g. `v0.1__add_index.rs`).
    ///
    /// Registering the same name twice replaces the earlier script.
    pub fn register(&mut self, filename: impl Into<String>, script: Arc<dyn MigrationScript>) {
        self.scripts.insert(filename.into(), script);
    }

    /// Register an async closure as a script.
    pub fn register_fn<F, Fut>(&mut self, filename: impl Into<String>, f: F)
    where
        F: Fn(MigrationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(filename, Arc::new(FnScript { f }));
    }

    /// Names of all registered files, sorted.
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scripts.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptLoader for ScriptRegistry {
    async fn load(&self, path: &Path) -> Result<Arc<dyn MigrationScript>, LoadError> {
        let name = file_name(path);
        self.scripts
            .get(&name)
            .cloned()
            .ok_or(LoadError::NotRegistered(name))
    }
}

/// Adapter running an async closure as a [`MigrationScript`].
struct FnScript<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MigrationScript for FnScript<F>
where
    F: Fn(MigrationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn migrate(&self, ctx: &MigrationContext) -> anyhow::Result<()> {
        (self.f)(ctx.clone()).await
    }
}
