//! Running a single migration script.

use super::loader::ScriptLoader;
use super::types::{MigrationContext, MigrationError, MigrationResult};
use crate::catalog::MigrationFile;
use crate::source::MigrationSource;
use crate::utils::{compute_hash, file_extension, now};
use tracing::{debug, error};

/// Load and invoke one migration, producing its result record.
///
/// Only a load failure is returned as an error: the script could not even
/// start. Anything the script itself raises is logged and recorded as
/// `success = false`.
pub async fn run_script(
    loader: &dyn ScriptLoader,
    source: &dyn MigrationSource,
    file: &MigrationFile,
    ctx: &MigrationContext,
    installed_rank: i64,
    installed_by: &str,
) -> Result<MigrationResult, MigrationError> {
    let script = match loader.load(&file.path).await {
        Ok(script) => script,
        Err(e) => {
            error!(script = %file.filename, error = %e, "Failed to load migration");
            return Err(MigrationError::ScriptLoad {
                script: file.filename.clone(),
                source: e,
            });
        }
    };

    let start = now();
    let outcome = script.migrate(ctx).await;
    let finish = now();

    let success = match outcome {
        Ok(()) => true,
        Err(e) => {
            let message = format!("{:#}", e);
            error!(script = %file.filename, error = %message, "Error in migration");
            false
        }
    };

    let bytes = source.read_bytes(&file.path).await?;

    debug!(script = %file.filename, "Uploading the results");

    Ok(MigrationResult {
        installed_rank,
        description: file.description.clone(),
        version: file.version.to_string(),
        script: file.filename.clone(),
        script_type: file_extension(&file.filename),
        checksum: compute_hash(&bytes),
        installed_by: installed_by.to_string(),
        installed_on: start,
        execution_time: (finish - start).num_milliseconds().max(0) as u64,
        success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::{Database, WriteStats};
    use crate::migration::{AppHandle, ScriptRegistry};
    use crate::source::FsMigrationSource;
    use crate::store::MemoryStore;
    use crate::version::SemVer;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::fs;

    async fn migration_file(dir: &std::path::Path, filename: &str, version: SemVer) -> MigrationFile {
        let path = dir.join(filename);
        fs::write(&path, filename.as_bytes()).await.unwrap();
        MigrationFile {
            filename: filename.to_string(),
            path,
            version,
            description: "first".to_string(),
        }
    }

    fn context() -> MigrationContext {
        MigrationContext {
            db: Database::new(Arc::new(MemoryStore::new()), Arc::new(WriteStats::new()), false),
            app: AppHandle::default(),
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn test_successful_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = migration_file(temp_dir.path(), "v0__first.rs", SemVer::new(0, 0, 0)).await;

        let mut registry = ScriptRegistry::new();
        registry.register_fn("v0__first.rs", |_ctx| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            anyhow::Ok(())
        });

        let result = run_script(&registry, &FsMigrationSource::new(), &file, &context(), 3, "tester")
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.installed_rank, 3);
        assert_eq!(result.version, "0.0.0");
        assert_eq!(result.description, "first");
        assert_eq!(result.script, "v0__first.rs");
        assert_eq!(result.script_type, "rs");
        assert_eq!(result.installed_by, "tester");
        assert_eq!(result.checksum, compute_hash(b"v0__first.rs"));
        assert!(result.execution_time >= 20);
    }

    #[tokio::test]
    async fn test_script_error_is_captured() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = migration_file(temp_dir.path(), "v0__first.rs", SemVer::new(0, 0, 0)).await;

        let mut registry = ScriptRegistry::new();
        registry.register_fn("v0__first.rs", |_ctx| async {
            Err::<(), _>(anyhow::anyhow!("boom"))
        });

        let result = run_script(&registry, &FsMigrationSource::new(), &file, &context(), 0, "tester")
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.checksum, compute_hash(b"v0__first.rs"));
    }

    #[tokio::test]
    async fn test_load_failure_is_returned() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = migration_file(temp_dir.path(), "v0__first.rs", SemVer::new(0, 0, 0)).await;

        let registry = ScriptRegistry::new();
        let err = run_script(&registry, &FsMigrationSource::new(), &file, &context(), 0, "tester")
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::ScriptLoad { ref script, .. } if script == "v0__first.rs"));
    }
}
