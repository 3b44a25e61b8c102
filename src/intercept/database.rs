use super::batch::WriteBatch;
use super::stats::{WriteKind, WriteStats};
use crate::store::{
    into_document, Direction, DocumentSnapshot, DocumentStore, Query, StoreError, Write,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Length of generated document ids.
const AUTO_ID_LENGTH: usize = 20;

/// Options for [`DocumentRef::set_with`] and [`WriteBatch::set_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge into the existing document instead of replacing it.
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    stats: Arc<WriteStats>,
    dry_run: bool,
}

/// Database handle given to migration scripts.
///
/// Every mutation made through this handle is classified and counted on the
/// shared [`WriteStats`]. In dry-run mode reads still hit the store but no
/// write is ever sent to it.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    pub fn new(store: Arc<dyn DocumentStore>, stats: Arc<WriteStats>, dry_run: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                stats,
                dry_run,
            }),
        }
    }

    /// Whether writes are being simulated.
    pub fn is_dry_run(&self) -> bool {
        self.inner.dry_run
    }

    pub fn stats(&self) -> &Arc<WriteStats> {
        &self.inner.stats
    }

    /// Reference a collection by its path.
    pub fn collection(&self, path: impl Into<String>) -> CollectionRef {
        CollectionRef {
            db: self.clone(),
            path: path.into(),
            order_by: None,
            limit: None,
        }
    }

    /// Reference a document by its full path.
    pub fn doc(&self, path: impl Into<String>) -> DocumentRef {
        DocumentRef {
            db: self.clone(),
            path: path.into(),
        }
    }

    /// Start a new write batch.
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.clone())
    }

    pub(crate) async fn commit_writes(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        if self.inner.dry_run {
            if !self.inner.stats.is_frozen() {
                debug!(writes = writes.len(), "Dry run, skipping commit");
            }
            return Ok(());
        }
        self.inner.store.commit(writes).await
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dry_run", &self.inner.dry_run)
            .field("stats", &self.inner.stats)
            .finish()
    }
}

/// Reference to a collection, optionally carrying query constraints.
#[derive(Debug, Clone)]
pub struct CollectionRef {
    db: Database,
    path: String,
    order_by: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl CollectionRef {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Reference a document inside this collection.
    pub fn doc(&self, id: &str) -> DocumentRef {
        self.db.doc(format!("{}/{}", self.path, id))
    }

    /// Reference a document with a freshly generated id.
    pub fn new_doc(&self) -> DocumentRef {
        let id: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(AUTO_ID_LENGTH)
            .collect();
        self.doc(&id)
    }

    /// Order query results by a field.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Cap the number of query results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run the query described by this reference.
    pub async fn get(&self) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let query = Query {
            collection: self.path.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
        };
        self.db.inner.store.query(&query).await
    }

    /// Add a new document with a generated id.
    ///
    /// Counted once as `added` at call time; the create that persists it is
    /// not counted again.
    pub async fn add(&self, data: Value) -> Result<DocumentRef, StoreError> {
        let doc = self.new_doc();
        let data = into_document(doc.path(), data)?;

        let stats = self.db.stats();
        if let Some(effect) = stats.track(WriteKind::Add, doc.path(), Some(&data)) {
            effect.apply(stats);
        }

        let mut batch = self.db.batch();
        batch.push_untracked(Write::Create {
            path: doc.path().to_string(),
            data,
        });
        batch.commit().await?;

        Ok(doc)
    }
}

/// Reference to a single document.
#[derive(Debug, Clone)]
pub struct DocumentRef {
    db: Database,
    path: String,
}

impl DocumentRef {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Collection containing this document.
    pub fn parent(&self) -> CollectionRef {
        let parent = self
            .path
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .unwrap_or_default();
        self.db.collection(parent)
    }

    /// Reference a subcollection of this document.
    pub fn collection(&self, id: &str) -> CollectionRef {
        self.db.collection(format!("{}/{}", self.path, id))
    }

    pub async fn get(&self) -> Result<Option<DocumentSnapshot>, StoreError> {
        self.db.inner.store.get(&self.path).await
    }

    pub async fn create(&self, data: Value) -> Result<(), StoreError> {
        let mut batch = self.db.batch();
        batch.create(self, data)?;
        batch.commit().await
    }

    pub async fn set(&self, data: Value) -> Result<(), StoreError> {
        self.set_with(data, SetOptions::default()).await
    }

    pub async fn set_with(&self, data: Value, options: SetOptions) -> Result<(), StoreError> {
        let mut batch = self.db.batch();
        batch.set_with(self, data, options)?;
        batch.commit().await
    }

    pub async fn update(&self, data: Value) -> Result<(), StoreError> {
        let mut batch = self.db.batch();
        batch.update(self, data)?;
        batch.commit().await
    }

    pub async fn delete(&self) -> Result<(), StoreError> {
        let mut batch = self.db.batch();
        batch.delete(self);
        batch.commit().await
    }
}
