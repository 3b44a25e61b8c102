//! Migrations written as JSON lists of write operations.
//!
//! ```json
//! {
//!   "operations": [
//!     { "op": "set", "path": "data/one", "data": { "key": "value" } },
//!     { "op": "add", "collection": "data", "data": { "key": "value" } },
//!     { "op": "batch", "operations": [
//!       { "op": "update", "path": "data/one", "data": { "key": "updated" } },
//!       { "op": "delete", "path": "data/two" }
//!     ] }
//!   ]
//! }
//! ```

use super::loader::{file_name, ScriptLoader};
use super::types::{LoadError, MigrationContext, MigrationScript};
use crate::intercept::{Database, SetOptions};
use crate::utils::file_extension;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// Extension handled by [`DeclarativeLoader`].
pub const DECLARATIVE_EXTENSION: &str = "json";

/// A write applied to a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DocumentOperation {
    Create {
        path: String,
        data: Value,
    },
    Set {
        path: String,
        data: Value,
        #[serde(default)]
        merge: bool,
    },
    Update {
        path: String,
        data: Value,
    },
    Delete {
        path: String,
    },
}

/// One step of a declarative migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Create {
        path: String,
        data: Value,
    },
    Set {
        path: String,
        data: Value,
        #[serde(default)]
        merge: bool,
    },
    Update {
        path: String,
        data: Value,
    },
    Delete {
        path: String,
    },
    /// Append a document with a generated id.
    Add {
        collection: String,
        data: Value,
    },
    /// Writes committed together in one batch.
    Batch {
        operations: Vec<DocumentOperation>,
    },
}

/// A parsed declarative migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeScript {
    pub operations: Vec<Operation>,
}

impl DeclarativeScript {
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        serde_json::from_str(content).map_err(|e| LoadError::InvalidScript(e.to_string()))
    }
}

#[async_trait]
impl MigrationScript for DeclarativeScript {
    async fn migrate(&self, ctx: &MigrationContext) -> anyhow::Result<()> {
        for operation in &self.operations {
            apply(&ctx.db, operation).await?;
        }
        Ok(())
    }
}

async fn apply(db: &Database, operation: &Operation) -> anyhow::Result<()> {
    match operation {
        Operation::Create { path, data } => db.doc(path.as_str()).create(data.clone()).await?,
        Operation::Set { path, data, merge } => {
            db.doc(path.as_str())
                .set_with(data.clone(), SetOptions { merge: *merge })
                .await?
        }
        Operation::Update { path, data } => db.doc(path.as_str()).update(data.clone()).await?,
        Operation::Delete { path } => db.doc(path.as_str()).delete().await?,
        Operation::Add { collection, data } => {
            db.collection(collection.as_str()).add(data.clone()).await?;
        }
        Operation::Batch { operations } => {
            let mut batch = db.batch();
            for op in operations {
                match op {
                    DocumentOperation::Create { path, data } => {
                        batch.create(&db.doc(path.as_str()), data.clone())?;
                    }
                    DocumentOperation::Set { path, data, merge } => {
                        batch.set_with(
                            &db.doc(path.as_str()),
                            data.clone(),
                            SetOptions { merge: *merge },
                        )?;
                    }
                    DocumentOperation::Update { path, data } => {
                        batch.update(&db.doc(path.as_str()), data.clone())?;
                    }
                    DocumentOperation::Delete { path } => {
                        batch.delete(&db.doc(path.as_str()));
                    }
                }
            }
            batch.commit().await?;
        }
    }
    Ok(())
}

/// Loads `.json` migration files as [`DeclarativeScript`]s.
#[derive(Debug, Clone, Default)]
pub struct DeclarativeLoader;

impl DeclarativeLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptLoader for DeclarativeLoader {
    async fn load(&self, path: &Path) -> Result<Arc<dyn MigrationScript>, LoadError> {
        let name = file_name(path);
        if file_extension(&name) != DECLARATIVE_EXTENSION {
            return Err(LoadError::UnsupportedType(name));
        }

        let content = fs::read_to_string(path).await?;
        Ok(Arc::new(DeclarativeScript::parse(&content)?))
    }
}
