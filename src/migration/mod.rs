//! Migration system.
//!
//! This module applies versioned, one-way migration scripts to a document
//! store and records one result per script in a history collection.
//!
//! # Overview
//!
//! - Files named `<version>__<description>.<ext>` are discovered by
//!   [`crate::catalog`]
//! - A [`ScriptLoader`] turns each file into a [`MigrationScript`]
//! - The [`MigrationExecutor`] runs pending scripts in version order
//! - Scripts write through an intercepted [`crate::intercept::Database`] that
//!   counts every mutation and honors dry-run mode
//! - The first failure is recorded and stops the run; nothing is rolled back
//!
//! # Usage
//!
//! ```ignore
//! let executor = MigrationExecutor::new(
//!     Arc::new(FsMigrationSource::new()),
//!     Arc::new(DeclarativeLoader::new()),
//!     Arc::new(FileStore::new("store.json")),
//! );
//! let stats = executor.migrate(&MigrateConfig::new("./migrations")).await?;
//! ```

pub mod declarative;
mod executor;
mod loader;
mod registry;
mod runner;
mod types;

pub use declarative::{DeclarativeLoader, DeclarativeScript};
pub use executor::{pending_files, MigrationExecutor};
pub use loader::ScriptLoader;
pub use registry::ScriptRegistry;
pub use runner::run_script;
pub use types::{
    record_id, AppHandle, LoadError, MigrationContext, MigrationError, MigrationResult,
    MigrationScript, RunStatistics,
};

use crate::config::MigrateConfig;
use crate::source::FsMigrationSource;
use crate::store::DocumentStore;
use std::sync::Arc;

/// Run pending migrations from the local file system against `store`.
pub async fn run_migrations(
    config: &MigrateConfig,
    store: Arc<dyn DocumentStore>,
    loader: Arc<dyn ScriptLoader>,
) -> Result<RunStatistics, MigrationError> {
    let executor = MigrationExecutor::new(Arc::new(FsMigrationSource::new()), loader, store)
        .with_app(AppHandle {
            name: env!("CARGO_PKG_NAME").to_string(),
            project_id: config.project_id.clone(),
        });
    executor.migrate(config).await
}
