//! Document database contract and the bundled implementations.
//!
//! The engine only talks to a database through [`DocumentStore`]: point
//! reads, ordered/limited collection queries and atomic multi-document
//! commits. Scripts never see a store directly; they get the intercepted
//! handle from [`crate::intercept`].

mod file;
mod memory;
mod types;

pub use file::{FileStore, StoreFile};
pub use memory::{DocumentMap, MemoryStore};
pub use types::{
    into_document, parent_collection, validate_collection_path, validate_document_path,
    Direction, Document, DocumentSnapshot, Query, StoreError, Write,
};

use async_trait::async_trait;

/// A document database client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document.
    async fn get(&self, path: &str) -> Result<Option<DocumentSnapshot>, StoreError>;

    /// Read documents of one collection, optionally ordered and limited.
    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Apply writes atomically.
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError>;
}
