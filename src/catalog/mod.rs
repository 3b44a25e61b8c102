//! Discovery of migration files.

use crate::migration::MigrationError;
use crate::source::MigrationSource;
use crate::version::{parse_filename, SemVer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A migration file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub filename: String,
    pub path: PathBuf,
    pub version: SemVer,
    pub description: String,
}

/// Find every migration file directly inside `directory`.
///
/// Hidden files, directories and names without the `__` separator are
/// skipped. The first malformed name or repeated version aborts discovery.
/// Files are returned in enumeration order; see [`sort_by_version`].
pub async fn discover(
    source: &dyn MigrationSource,
    directory: &Path,
) -> Result<Vec<MigrationFile>, MigrationError> {
    if !source.exists(directory).await {
        return Err(MigrationError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut seen: HashMap<SemVer, String> = HashMap::new();

    for filename in source.list_entries(directory).await? {
        let path = directory.join(&filename);
        if source.is_directory(&path).await? {
            continue;
        }

        let Some(parsed) = parse_filename(&filename)? else {
            debug!(file = %filename, "Skipping non-migration file");
            continue;
        };

        if let Some(existing) = seen.get(&parsed.version) {
            return Err(MigrationError::DuplicateVersion {
                first: existing.clone(),
                second: filename,
            });
        }
        seen.insert(parsed.version.clone(), filename.clone());

        files.push(MigrationFile {
            filename,
            path,
            version: parsed.version,
            description: parsed.description,
        });
    }

    Ok(files)
}

/// Order files by ascending version.
pub fn sort_by_version(files: &mut [MigrationFile]) {
    files.sort_by(|a, b| a.version.cmp(&b.version));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FsMigrationSource;
    use tokio::fs;

    async fn dir_with(names: &[&str]) -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(temp_dir.path().join(name), "{}").await.unwrap();
        }
        temp_dir
    }

    #[tokio::test]
    async fn test_discover_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = discover(&FsMigrationSource::new(), &missing).await.unwrap_err();
        assert!(matches!(err, MigrationError::DirectoryNotFound(_)));
        assert!(err.to_string().starts_with("No directory at"));
    }

    #[tokio::test]
    async fn test_discover_parses_and_skips() {
        let temp_dir = dir_with(&["v0.1__second.json", "v0__first.json", "README.md", ".hidden"]).await;
        fs::create_dir(temp_dir.path().join("v2__folder")).await.unwrap();

        let mut files = discover(&FsMigrationSource::new(), temp_dir.path())
            .await
            .unwrap();
        sort_by_version(&mut files);

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "v0__first.json");
        assert_eq!(files[0].version, SemVer::new(0, 0, 0));
        assert_eq!(files[0].description, "first");
        assert_eq!(files[0].path, temp_dir.path().join("v0__first.json"));
        assert_eq!(files[1].version, SemVer::new(0, 1, 0));
    }

    #[tokio::test]
    async fn test_discover_rejects_invalid_name() {
        let temp_dir = dir_with(&["v0__first.json", "vX__broken.json"]).await;

        let err = discover(&FsMigrationSource::new(), temp_dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::VersionError(_)));
        assert!(err.to_string().contains("doesn't match the required format"));
    }

    #[tokio::test]
    async fn test_discover_rejects_duplicate_versions() {
        let temp_dir = dir_with(&["v1__a.json", "v1.0.1__c.json", "v1.0.0__b.json"]).await;

        let err = discover(&FsMigrationSource::new(), temp_dir.path())
            .await
            .unwrap_err();
        match err {
            MigrationError::DuplicateVersion { first, second } => {
                let mut names = vec![first, second];
                names.sort();
                assert_eq!(names, vec!["v1.0.0__b.json", "v1__a.json"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let files = discover(&FsMigrationSource::new(), temp_dir.path())
            .await
            .unwrap();
        assert!(files.is_empty());
    }
}
