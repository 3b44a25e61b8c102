//! Types shared by document store implementations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Error types for document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("No document to update: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Expected a JSON object for {0}")]
    NotAnObject(String),
}

/// A single mutation sent to the store as part of a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Write a new document, failing if it already exists.
    Create { path: String, data: Document },
    /// Overwrite a document, or merge into it when `merge` is set.
    Set {
        path: String,
        data: Document,
        merge: bool,
    },
    /// Change fields of an existing document. Keys may be dotted field paths.
    Update { path: String, data: Document },
    /// Remove a document if present.
    Delete { path: String },
}

impl Write {
    pub fn path(&self) -> &str {
        match self {
            Write::Create { path, .. }
            | Write::Set { path, .. }
            | Write::Update { path, .. }
            | Write::Delete { path } => path,
        }
    }
}

/// Sort direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// A query over the documents of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            order_by: None,
            limit: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub path: String,
    pub data: Document,
}

impl DocumentSnapshot {
    /// Last path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Deserialize the document into a typed value.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').collect()
}

/// Check that a path addresses a document: an even number of non-empty segments.
pub fn validate_document_path(path: &str) -> Result<(), StoreError> {
    let parts = segments(path);
    if parts.iter().any(|s| s.is_empty()) || parts.len() % 2 != 0 {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Check that a path addresses a collection: an odd number of non-empty segments.
pub fn validate_collection_path(path: &str) -> Result<(), StoreError> {
    let parts = segments(path);
    if parts.iter().any(|s| s.is_empty()) || parts.len() % 2 != 1 {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Collection path that a document path belongs to.
pub fn parent_collection(document_path: &str) -> Option<&str> {
    document_path.rsplit_once('/').map(|(parent, _)| parent)
}

/// Convert an arbitrary JSON value into a document.
pub fn into_document(path: &str, value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject(path.to_string())),
    }
}
