//! Migration executor for running migrations.

use super::loader::ScriptLoader;
use super::runner::run_script;
use super::types::{AppHandle, MigrationContext, MigrationError, MigrationResult, RunStatistics};
use crate::catalog::{discover, sort_by_version, MigrationFile};
use crate::config::MigrateConfig;
use crate::history::HistoryStore;
use crate::intercept::{Database, WriteStats};
use crate::source::MigrationSource;
use crate::store::DocumentStore;
use crate::utils::current_user;
use crate::version::SemVer;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Executor for running migrations.
///
/// Each call to [`MigrationExecutor::migrate`] discovers the migration files,
/// resolves the last applied version from history, and runs every pending
/// file in version order. The first failing script stops the run after its
/// result has been recorded.
pub struct MigrationExecutor {
    source: Arc<dyn MigrationSource>,
    loader: Arc<dyn ScriptLoader>,
    store: Arc<dyn DocumentStore>,
    app: AppHandle,
}

impl MigrationExecutor {
    /// Create a new executor over the given collaborators.
    pub fn new(
        source: Arc<dyn MigrationSource>,
        loader: Arc<dyn ScriptLoader>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            source,
            loader,
            store,
            app: AppHandle {
                name: env!("CARGO_PKG_NAME").to_string(),
                project_id: None,
            },
        }
    }

    /// Set the application handle passed to scripts.
    pub fn with_app(mut self, app: AppHandle) -> Self {
        self.app = app;
        self
    }

    /// Apply every pending migration.
    ///
    /// This method:
    /// 1. Discovers migration files in the source directory
    /// 2. Reads the latest result from history
    /// 3. Computes and sorts the pending files
    /// 4. Runs each one, recording its result with counting frozen
    /// 5. Stops at the first failure
    pub async fn migrate(&self, config: &MigrateConfig) -> Result<RunStatistics, MigrationError> {
        let directory = &config.source_directory;
        let files = discover(self.source.as_ref(), directory).await?;
        let scanned_files = files.len();

        info!(
            count = scanned_files,
            path = %directory.display(),
            "Found {} migration file{}",
            scanned_files,
            plural(scanned_files)
        );
        if config.dry_run {
            info!("Dry run mode, no records will be touched");
        }

        let stats = Arc::new(WriteStats::new());
        let db = Database::new(Arc::clone(&self.store), Arc::clone(&stats), config.dry_run);
        let history = HistoryStore::new(&db, &config.results_collection);

        let latest = history.latest().await?;
        let pending = pending_files(files, latest.as_ref())?;

        info!(
            count = pending.len(),
            path = %directory.display(),
            "Executing {} migration file{}",
            pending.len(),
            plural(pending.len())
        );

        let ctx = MigrationContext {
            db,
            app: self.app.clone(),
            dry_run: config.dry_run,
        };
        let installed_by = config.installed_by.clone().unwrap_or_else(current_user);

        let mut installed_rank = latest.as_ref().map(|l| l.installed_rank).unwrap_or(-1);
        let mut executed_files = 0;

        for file in &pending {
            executed_files += 1;
            installed_rank += 1;
            debug!(script = %file.filename, rank = installed_rank, "Running migration");

            let result = run_script(
                self.loader.as_ref(),
                self.source.as_ref(),
                file,
                &ctx,
                installed_rank,
                &installed_by,
            )
            .await?;

            {
                let _frozen = stats.freeze();
                history.persist(&result).await?;
            }

            if !result.success {
                error!(
                    script = %result.script,
                    version = %result.version,
                    "Stopped at first failure"
                );
                return Err(MigrationError::ExecutionHalted {
                    version: result.version,
                    script: result.script,
                });
            }
        }

        let statistics = RunStatistics::new(scanned_files, executed_files, stats.counts());

        info!("Finished all migrations");
        info!(
            "Files scanned: {}, executed: {}",
            statistics.scanned_files, statistics.executed_files
        );
        if statistics.executed_files > 0 {
            info!(
                "Docs added: {}, created: {}, updated: {}, set: {}, deleted: {}",
                statistics.added,
                statistics.created,
                statistics.updated,
                statistics.set,
                statistics.deleted
            );
        }

        Ok(statistics)
    }

    /// All recorded results in a collection, lowest rank first.
    pub async fn history(&self, collection: &str) -> Result<Vec<MigrationResult>, MigrationError> {
        let db = Database::new(Arc::clone(&self.store), Arc::new(WriteStats::new()), true);
        Ok(HistoryStore::new(&db, collection).list().await?)
    }
}

/// Select the files to run given the latest history record.
///
/// A file is pending when its version is newer than the baseline, or when
/// the baseline failed and the file carries that same version. A failed
/// baseline that no file retries is an error.
pub fn pending_files(
    files: Vec<MigrationFile>,
    baseline: Option<&MigrationResult>,
) -> Result<Vec<MigrationFile>, MigrationError> {
    let mut pending = match baseline {
        None => files,
        Some(baseline) => {
            let baseline_version = SemVer::parse(&baseline.version)?;
            let retry_failed = !baseline.success;

            let pending: Vec<MigrationFile> = files
                .into_iter()
                .filter(|f| {
                    f.version > baseline_version
                        || (retry_failed && f.version == baseline_version)
                })
                .collect();

            if retry_failed && !pending.iter().any(|f| f.version == baseline_version) {
                return Err(MigrationError::UnresolvedPriorFailure {
                    version: baseline.version.clone(),
                    script: baseline.script.clone(),
                });
            }

            pending
        }
    };

    sort_by_version(&mut pending);
    Ok(pending)
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn file(filename: &str, version: SemVer) -> MigrationFile {
        MigrationFile {
            filename: filename.to_string(),
            path: PathBuf::from(filename),
            version,
            description: "test".to_string(),
        }
    }

    fn baseline(version: &str, success: bool) -> MigrationResult {
        MigrationResult {
            installed_rank: 4,
            description: "test".to_string(),
            version: version.to_string(),
            script: format!("v{}__test.json", version),
            script_type: "json".to_string(),
            checksum: String::new(),
            installed_by: "tester".to_string(),
            installed_on: Utc::now(),
            execution_time: 0,
            success,
        }
    }

    fn catalog() -> Vec<MigrationFile> {
        vec![
            file("v1__c.json", SemVer::new(1, 0, 0)),
            file("v0__a.json", SemVer::new(0, 0, 0)),
            file("v0.1__b.json", SemVer::new(0, 1, 0)),
        ]
    }

    fn names(files: &[MigrationFile]) -> Vec<&str> {
        files.iter().map(|f| f.filename.as_str()).collect()
    }

    #[test]
    fn test_pending_without_baseline_is_everything_sorted() {
        let pending = pending_files(catalog(), None).unwrap();
        assert_eq!(names(&pending), vec!["v0__a.json", "v0.1__b.json", "v1__c.json"]);
    }

    #[test]
    fn test_pending_after_successful_baseline() {
        let pending = pending_files(catalog(), Some(&baseline("0.1.0", true))).unwrap();
        assert_eq!(names(&pending), vec!["v1__c.json"]);

        let pending = pending_files(catalog(), Some(&baseline("1.0.0", true))).unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_failed_baseline_is_retried() {
        let pending = pending_files(catalog(), Some(&baseline("0.1.0", false))).unwrap();
        assert_eq!(names(&pending), vec!["v0.1__b.json", "v1__c.json"]);
    }

    #[test]
    fn test_failed_baseline_without_file_is_fatal() {
        let err = pending_files(catalog(), Some(&baseline("0.5.0", false))).unwrap_err();
        match err {
            MigrationError::UnresolvedPriorFailure { version, script } => {
                assert_eq!(version, "0.5.0");
                assert_eq!(script, "v0.5.0__test.json");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(0), "s");
        assert_eq!(plural(1), "");
        assert_eq!(plural(2), "s");
    }
}
