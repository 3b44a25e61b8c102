use super::database::{Database, DocumentRef, SetOptions};
use super::stats::{PendingEffect, WriteKind};
use crate::store::{into_document, StoreError, Write};
use serde_json::Value;

/// A set of writes committed together.
///
/// Each queued operation carries the counting and logging it owes. Nothing is
/// counted until [`WriteBatch::commit`] runs, and a batch dropped without a
/// commit leaves no trace.
pub struct WriteBatch {
    db: Database,
    writes: Vec<Write>,
    effects: Vec<PendingEffect>,
}

impl WriteBatch {
    pub(crate) fn new(db: Database) -> Self {
        Self {
            db,
            writes: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Queue creation of a document that must not exist yet.
    pub fn create(&mut self, doc: &DocumentRef, data: Value) -> Result<&mut Self, StoreError> {
        let data = into_document(doc.path(), data)?;
        self.push(
            WriteKind::Create,
            Write::Create {
                path: doc.path().to_string(),
                data,
            },
        );
        Ok(self)
    }

    /// Queue an overwrite of a document.
    pub fn set(&mut self, doc: &DocumentRef, data: Value) -> Result<&mut Self, StoreError> {
        self.set_with(doc, data, SetOptions::default())
    }

    /// Queue an overwrite, or a merge when `options.merge` is set.
    pub fn set_with(
        &mut self,
        doc: &DocumentRef,
        data: Value,
        options: SetOptions,
    ) -> Result<&mut Self, StoreError> {
        let data = into_document(doc.path(), data)?;
        self.push(
            WriteKind::Set {
                merge: options.merge,
            },
            Write::Set {
                path: doc.path().to_string(),
                data,
                merge: options.merge,
            },
        );
        Ok(self)
    }

    /// Queue a field update of an existing document.
    pub fn update(&mut self, doc: &DocumentRef, data: Value) -> Result<&mut Self, StoreError> {
        let data = into_document(doc.path(), data)?;
        self.push(
            WriteKind::Update,
            Write::Update {
                path: doc.path().to_string(),
                data,
            },
        );
        Ok(self)
    }

    /// Queue deletion of a document.
    pub fn delete(&mut self, doc: &DocumentRef) -> &mut Self {
        self.push(
            WriteKind::Delete,
            Write::Delete {
                path: doc.path().to_string(),
            },
        );
        self
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Apply queued effects in order, then commit unless this is a dry run.
    pub async fn commit(self) -> Result<(), StoreError> {
        let stats = self.db.stats();
        for effect in self.effects {
            effect.apply(stats);
        }

        if self.writes.is_empty() {
            return Ok(());
        }

        self.db.commit_writes(self.writes).await
    }

    /// Queue a write whose effect was already accounted for elsewhere.
    pub(crate) fn push_untracked(&mut self, write: Write) {
        self.writes.push(write);
    }

    fn push(&mut self, kind: WriteKind, write: Write) {
        let data = match &write {
            Write::Create { data, .. } | Write::Set { data, .. } | Write::Update { data, .. } => {
                Some(data)
            }
            Write::Delete { .. } => None,
        };

        if let Some(effect) = self.db.stats().track(kind, write.path(), data) {
            self.effects.push(effect);
        }
        self.writes.push(write);
    }
}
