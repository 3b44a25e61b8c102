//! Write counters shared between the intercepted handle and the orchestrator.

use crate::store::Document;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, Level};

/// Classification of a user-visible mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Set { merge: bool },
    Update,
    Delete,
    /// Append a new document with a generated id.
    Add,
}

impl WriteKind {
    /// Verb used when logging the mutation.
    pub fn verb(&self) -> &'static str {
        match self {
            WriteKind::Create => "Creating",
            WriteKind::Set { merge: false } => "Setting",
            WriteKind::Set { merge: true } => "Merging",
            WriteKind::Update => "Updating",
            WriteKind::Delete => "Deleting",
            WriteKind::Add => "Adding",
        }
    }
}

/// Snapshot of the per-kind counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCounts {
    pub created: u64,
    pub set: u64,
    pub updated: u64,
    pub deleted: u64,
    pub added: u64,
}

/// Live write counters with a freeze gate.
///
/// While at least one [`FreezeGuard`] is alive the interceptor neither
/// counts nor logs, which keeps the engine's own bookkeeping writes out of
/// the statistics.
#[derive(Debug, Default)]
pub struct WriteStats {
    created: AtomicU64,
    set: AtomicU64,
    updated: AtomicU64,
    deleted: AtomicU64,
    added: AtomicU64,
    frozen: AtomicUsize,
}

impl WriteStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst) > 0
    }

    /// Freeze counting until the returned guard is dropped.
    pub fn freeze(&self) -> FreezeGuard<'_> {
        self.frozen.fetch_add(1, Ordering::SeqCst);
        FreezeGuard { stats: self }
    }

    /// Current counter values.
    pub fn counts(&self) -> WriteCounts {
        WriteCounts {
            created: self.created.load(Ordering::SeqCst),
            set: self.set.load(Ordering::SeqCst),
            updated: self.updated.load(Ordering::SeqCst),
            deleted: self.deleted.load(Ordering::SeqCst),
            added: self.added.load(Ordering::SeqCst),
        }
    }

    fn counter(&self, kind: WriteKind) -> &AtomicU64 {
        match kind {
            WriteKind::Create => &self.created,
            WriteKind::Set { .. } => &self.set,
            WriteKind::Update => &self.updated,
            WriteKind::Delete => &self.deleted,
            WriteKind::Add => &self.added,
        }
    }

    fn increment(&self, kind: WriteKind) {
        self.counter(kind).fetch_add(1, Ordering::SeqCst);
    }

    /// Start tracking a mutation. Returns `None` while frozen.
    pub(crate) fn track(
        &self,
        kind: WriteKind,
        path: &str,
        data: Option<&Document>,
    ) -> Option<PendingEffect> {
        if self.is_frozen() {
            return None;
        }
        // Payloads are only kept for the debug log line
        let detail = if tracing::enabled!(Level::DEBUG) {
            data.cloned()
        } else {
            None
        };
        Some(PendingEffect {
            kind,
            path: path.to_string(),
            detail,
        })
    }
}

/// Unfreezes the counters when dropped.
#[must_use = "counting resumes as soon as the guard is dropped"]
pub struct FreezeGuard<'a> {
    stats: &'a WriteStats,
}

impl Drop for FreezeGuard<'_> {
    fn drop(&mut self) {
        self.stats.frozen.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Counting and logging owed for one mutation, applied once it takes effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEffect {
    kind: WriteKind,
    path: String,
    detail: Option<Document>,
}

impl PendingEffect {
    pub(crate) fn apply(self, stats: &WriteStats) {
        stats.increment(self.kind);
        match &self.detail {
            Some(detail) => debug!(
                path = %self.path,
                data = %serde_json::to_string(detail).unwrap_or_default(),
                "{}",
                self.kind.verb()
            ),
            None => debug!(path = %self.path, "{}", self.kind.verb()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_and_apply_counts_by_kind() {
        let stats = WriteStats::new();
        for kind in [
            WriteKind::Create,
            WriteKind::Set { merge: false },
            WriteKind::Set { merge: true },
            WriteKind::Update,
            WriteKind::Delete,
            WriteKind::Add,
        ] {
            stats.track(kind, "data/one", None).unwrap().apply(&stats);
        }

        assert_eq!(
            stats.counts(),
            WriteCounts {
                created: 1,
                set: 2,
                updated: 1,
                deleted: 1,
                added: 1,
            }
        );
    }

    #[test]
    fn test_tracking_is_lazy_until_applied() {
        let stats = WriteStats::new();
        let effect = stats.track(WriteKind::Update, "data/one", None).unwrap();
        assert_eq!(stats.counts().updated, 0);

        effect.apply(&stats);
        assert_eq!(stats.counts().updated, 1);
    }

    #[test]
    fn test_freeze_guard_suppresses_tracking() {
        let stats = WriteStats::new();
        {
            let _frozen = stats.freeze();
            assert!(stats.is_frozen());
            assert!(stats.track(WriteKind::Set { merge: false }, "a/b", None).is_none());
        }
        assert!(!stats.is_frozen());
        assert!(stats.track(WriteKind::Set { merge: false }, "a/b", None).is_some());
    }

    #[test]
    fn test_nested_freeze_guards() {
        let stats = WriteStats::new();
        let outer = stats.freeze();
        let inner = stats.freeze();
        drop(inner);
        assert!(stats.is_frozen());
        drop(outer);
        assert!(!stats.is_frozen());
    }

    #[test]
    fn test_payload_kept_only_when_debug_is_enabled() {
        use tracing_subscriber::filter::LevelFilter;
        use tracing_subscriber::layer::SubscriberExt;

        let stats = WriteStats::new();
        let mut data = Document::new();
        data.insert("key".to_string(), serde_json::json!("value"));

        {
            let _guard = tracing::subscriber::set_default(
                tracing_subscriber::registry().with(LevelFilter::INFO),
            );
            let effect = stats.track(WriteKind::Create, "data/one", Some(&data)).unwrap();
            assert_eq!(effect.detail, None);
        }

        {
            let _guard = tracing::subscriber::set_default(
                tracing_subscriber::registry().with(LevelFilter::DEBUG),
            );
            let effect = stats.track(WriteKind::Create, "data/one", Some(&data)).unwrap();
            assert_eq!(effect.detail, Some(data.clone()));
        }
    }

    #[test]
    fn test_verbs() {
        assert_eq!(WriteKind::Set { merge: true }.verb(), "Merging");
        assert_eq!(WriteKind::Set { merge: false }.verb(), "Setting");
        assert_eq!(WriteKind::Add.verb(), "Adding");
    }
}
