//! Access to the directory holding migration files.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Where migration files come from.
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// Whether the given path exists at all.
    async fn exists(&self, path: &Path) -> bool;

    /// Names of the direct children of `directory`, without recursion.
    async fn list_entries(&self, directory: &Path) -> Result<Vec<String>, std::io::Error>;

    /// Whether the given path is a directory.
    async fn is_directory(&self, path: &Path) -> Result<bool, std::io::Error>;

    /// Raw bytes of a file.
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error>;
}

/// Migration source backed by the local file system.
#[derive(Debug, Clone, Default)]
pub struct FsMigrationSource;

impl FsMigrationSource {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a relative directory against the current working directory.
    pub fn resolve(directory: &Path) -> PathBuf {
        if directory.is_absolute() {
            return directory.to_path_buf();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(directory))
            .unwrap_or_else(|_| directory.to_path_buf())
    }
}

#[async_trait]
impl MigrationSource for FsMigrationSource {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn list_entries(&self, directory: &Path) -> Result<Vec<String>, std::io::Error> {
        let mut names = Vec::new();

        for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }

        names.sort();
        Ok(names)
    }

    async fn is_directory(&self, path: &Path) -> Result<bool, std::io::Error> {
        Ok(fs::metadata(path).await?.is_dir())
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        fs::read(path).await
    }
}
