//! Write interception for migration scripts.
//!
//! Scripts receive a [`Database`] instead of a raw store. The handle exposes
//! the usual document-database surface (collections, documents, batches,
//! `add`) and records every mutation on a shared [`WriteStats`]:
//!
//! - batched writes count when their batch commits, in enqueue order
//! - document-level writes are single-operation batches
//! - `add` counts immediately and its internal create is never counted twice
//! - dry-run skips every store commit but still counts and logs
//! - a [`FreezeGuard`] hides bookkeeping writes from the counters

mod batch;
mod database;
mod stats;

pub use batch::WriteBatch;
pub use database::{CollectionRef, Database, DocumentRef, SetOptions};
pub use stats::{FreezeGuard, PendingEffect, WriteCounts, WriteKind, WriteStats};
