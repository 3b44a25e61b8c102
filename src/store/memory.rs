//! In-process document store.

use super::types::{
    parent_collection, validate_collection_path, validate_document_path, Direction, Document,
    DocumentSnapshot, Query, StoreError, Write,
};
use super::DocumentStore;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// All documents keyed by their full path.
pub type DocumentMap = BTreeMap<String, Document>;

/// Document store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<DocumentMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents directly inside a collection.
    pub async fn count(&self, collection: &str) -> usize {
        let documents = self.documents.lock().await;
        documents
            .keys()
            .filter(|path| parent_collection(path) == Some(collection))
            .count()
    }

    /// Copy of every stored document.
    pub async fn snapshot(&self) -> DocumentMap {
        self.documents.lock().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        validate_document_path(path)?;
        let documents = self.documents.lock().await;
        Ok(documents.get(path).map(|data| DocumentSnapshot {
            path: path.to_string(),
            data: data.clone(),
        }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let documents = self.documents.lock().await;
        run_query(&documents, query)
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        apply_writes(&mut documents, writes)
    }
}

/// Apply a set of writes atomically: either all of them land or none do.
pub fn apply_writes(documents: &mut DocumentMap, writes: Vec<Write>) -> Result<(), StoreError> {
    let mut staged = documents.clone();

    for write in writes {
        validate_document_path(write.path())?;

        match write {
            Write::Create { path, data } => {
                if staged.contains_key(&path) {
                    return Err(StoreError::AlreadyExists(path));
                }
                staged.insert(path, data);
            }
            Write::Set {
                path,
                data,
                merge: false,
            } => {
                staged.insert(path, data);
            }
            Write::Set {
                path,
                data,
                merge: true,
            } => {
                let target = staged.entry(path).or_default();
                merge_into(target, data);
            }
            Write::Update { path, data } => {
                let target = staged
                    .get_mut(&path)
                    .ok_or_else(|| StoreError::NotFound(path.clone()))?;
                for (field_path, value) in data {
                    set_field(target, &field_path, value);
                }
            }
            Write::Delete { path } => {
                staged.remove(&path);
            }
        }
    }

    *documents = staged;
    Ok(())
}

/// Select, order and limit the documents of one collection.
pub fn run_query(documents: &DocumentMap, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
    validate_collection_path(&query.collection)?;

    let mut matches: Vec<DocumentSnapshot> = documents
        .iter()
        .filter(|(path, _)| parent_collection(path) == Some(query.collection.as_str()))
        .map(|(path, data)| DocumentSnapshot {
            path: path.clone(),
            data: data.clone(),
        })
        .collect();

    if let Some((field, direction)) = &query.order_by {
        // Documents without the ordering field are not part of the result
        matches.retain(|snapshot| get_field(&snapshot.data, field).is_some());
        matches.sort_by(|a, b| {
            let ordering = compare_values(
                get_field(&a.data, field).unwrap_or(&Value::Null),
                get_field(&b.data, field).unwrap_or(&Value::Null),
            );
            match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        matches.truncate(limit);
    }

    Ok(matches)
}

/// Recursively merge `data` into `target`; nested objects merge, everything else replaces.
fn merge_into(target: &mut Document, data: Document) {
    for (key, value) in data {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Set a possibly dotted field path, creating intermediate objects.
fn set_field(target: &mut Document, field_path: &str, value: Value) {
    match field_path.split_once('.') {
        None => {
            target.insert(field_path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Document::new()));
            if !child.is_object() {
                *child = Value::Object(Document::new());
            }
            if let Value::Object(map) = child {
                set_field(map, rest, value);
            }
        }
    }
}

/// Look up a possibly dotted field path.
fn get_field<'a>(document: &'a Document, field_path: &str) -> Option<&'a Value> {
    match field_path.split_once('.') {
        None => document.get(field_path),
        Some((head, rest)) => match document.get(head)? {
            Value::Object(map) => get_field(map, rest),
            _ => None,
        },
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
