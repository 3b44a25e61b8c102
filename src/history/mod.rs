//! Migration history kept in a dedicated collection.
//!
//! One document per migration version, keyed `v<version>__<description>`.
//! Re-running a failed version overwrites its own record.

use crate::intercept::{CollectionRef, Database};
use crate::migration::MigrationResult;
use crate::store::{Direction, StoreError};

/// Field used to order history records.
const RANK_FIELD: &str = "installed_rank";

/// Reads and writes [`MigrationResult`] records.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    collection: CollectionRef,
}

impl HistoryStore {
    pub fn new(db: &Database, collection: &str) -> Self {
        Self {
            collection: db.collection(collection),
        }
    }

    /// The record with the highest installed rank, if any.
    pub async fn latest(&self) -> Result<Option<MigrationResult>, StoreError> {
        let docs = self
            .collection
            .clone()
            .order_by(RANK_FIELD, Direction::Desc)
            .limit(1)
            .get()
            .await?;

        docs.first().map(|doc| doc.deserialize()).transpose()
    }

    /// Every record, lowest rank first.
    pub async fn list(&self) -> Result<Vec<MigrationResult>, StoreError> {
        let docs = self
            .collection
            .clone()
            .order_by(RANK_FIELD, Direction::Asc)
            .get()
            .await?;

        docs.iter().map(|doc| doc.deserialize()).collect()
    }

    /// Write a record under its deterministic id.
    ///
    /// Goes through the intercepted handle, so nothing is written in a dry
    /// run. Callers freeze the write counters around this call.
    pub async fn persist(&self, result: &MigrationResult) -> Result<(), StoreError> {
        let value = serde_json::to_value(result)?;
        self.collection.doc(&result.record_id()).set(value).await
    }
}
