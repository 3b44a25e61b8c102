//! Document store persisted to a single JSON file.

use super::memory::{apply_writes, run_query, DocumentMap};
use super::types::{validate_document_path, DocumentSnapshot, Query, StoreError, Write};
use super::DocumentStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// On-disk layout of the store file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreFile {
    /// Schema version of the file format
    pub schema_version: u32,

    /// When the file was last written
    pub updated_at: String,

    /// Map of document path -> document
    pub documents: DocumentMap,
}

impl StoreFile {
    pub fn new() -> Self {
        Self {
            schema_version: 1,
            updated_at: crate::utils::now_iso(),
            documents: DocumentMap::new(),
        }
    }
}

/// Document store that reads and rewrites a JSON file on every operation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Read the store file, treating a missing file as empty
    async fn read(&self) -> Result<StoreFile, StoreError> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(StoreFile::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let file: StoreFile = serde_json::from_str(&content)?;
        Ok(file)
    }

    /// Write the store file atomically (caller must hold the lock)
    async fn write_unlocked(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, path: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        validate_document_path(path)?;
        let _guard = self.lock.lock().await;
        let file = self.read().await?;

        Ok(file.documents.get(path).map(|data| DocumentSnapshot {
            path: path.to_string(),
            data: data.clone(),
        }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.read().await?;
        run_query(&file.documents, query)
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        // Lock the entire read-modify-write cycle
        let _guard = self.lock.lock().await;

        let mut file = self.read().await?;
        apply_writes(&mut file.documents, writes)?;
        file.updated_at = crate::utils::now_iso();
        self.write_unlocked(&file).await
    }
}
