//! Working-memory checkpointing (§4.4): every N message boundaries the
//! cognition pipeline's in-memory map is flushed to the store atomically;
//! an error hook force-flushes on an unhandled exception; a startup
//! reconciliation decides who wins between the in-memory and stored view.

use crate::store::WorkingMemoryTable;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const DEFAULT_CHECKPOINT_EVERY: u32 = 5;
const RECONCILIATION_THRESHOLD_SECS: i64 = 60;

/// One pending in-memory write, staged before a checkpoint flush.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub key: String,
    pub value: serde_json::Value,
    pub category: String,
    pub importance: f64,
    pub session_id: Option<String>,
}

/// Which view won startup reconciliation, and why (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    MemoryWins,
    StoreWins,
}

pub struct Checkpointer {
    table: Arc<WorkingMemoryTable>,
    every_n: u32,
    boundary_count: AtomicU32,
}

impl Checkpointer {
    pub fn new(table: Arc<WorkingMemoryTable>) -> Self {
        Self {
            table,
            every_n: DEFAULT_CHECKPOINT_EVERY,
            boundary_count: AtomicU32::new(0),
        }
    }

    pub fn with_every_n(mut self, every_n: u32) -> Self {
        self.every_n = every_n.max(1);
        self
    }

    /// Call once per message boundary. Returns `true` when this boundary
    /// triggers a checkpoint (the caller should then call `flush`).
    pub fn on_message_boundary(&self) -> bool {
        let count = self.boundary_count.fetch_add(1, Ordering::SeqCst) + 1;
        count % self.every_n == 0
    }

    /// Atomically persist `pending` (each item's write is itself an atomic
    /// file write via `WorkingMemoryTable::put`; §4.4 "writes the
    /// in-memory working-memory map to the store atomically").
    pub fn flush(&self, pending: &[PendingWrite]) -> crate::error::Result<()> {
        for item in pending {
            self.table.put(
                &item.key,
                item.value.clone(),
                &item.category,
                item.importance,
                item.session_id.clone(),
            )?;
        }
        Ok(())
    }

    /// Force a flush regardless of boundary count — used by the error hook
    /// before the process exits on an unhandled exception (§4.4).
    pub fn force_flush(&self, pending: &[PendingWrite]) -> crate::error::Result<()> {
        self.flush(pending)
    }

    /// Startup reconciliation: `<1 min` difference -> memory wins, `>=1
    /// min` -> store wins (§4.4).
    pub fn reconcile_startup(
        in_memory_ts: DateTime<Utc>,
        stored_ts: DateTime<Utc>,
    ) -> ReconciliationOutcome {
        let diff = (in_memory_ts - stored_ts).num_seconds().abs();
        if diff < RECONCILIATION_THRESHOLD_SECS {
            ReconciliationOutcome::MemoryWins
        } else {
            ReconciliationOutcome::StoreWins
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_table() -> Arc<WorkingMemoryTable> {
        let dir = std::env::temp_dir().join(format!("aria-checkpoint-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Arc::new(WorkingMemoryTable::open(&dir).unwrap())
    }

    #[test]
    fn checkpoint_triggers_every_nth_boundary() {
        let checkpointer = Checkpointer::new(temp_table()).with_every_n(3);
        assert!(!checkpointer.on_message_boundary());
        assert!(!checkpointer.on_message_boundary());
        assert!(checkpointer.on_message_boundary());
        assert!(!checkpointer.on_message_boundary());
    }

    #[test]
    fn flush_persists_pending_writes() {
        let table = temp_table();
        let checkpointer = Checkpointer::new(table.clone());
        checkpointer
            .flush(&[PendingWrite {
                key: "topic".to_string(),
                value: serde_json::json!("rust"),
                category: "context".to_string(),
                importance: 0.4,
                session_id: Some("s1".to_string()),
            }])
            .unwrap();
        assert_eq!(table.for_session(Some("s1")).len(), 1);
    }

    #[test]
    fn small_drift_prefers_memory() {
        let now = crate::util::now();
        let outcome = Checkpointer::reconcile_startup(now, now - chrono::Duration::seconds(10));
        assert_eq!(outcome, ReconciliationOutcome::MemoryWins);
    }

    #[test]
    fn large_drift_prefers_store() {
        let now = crate::util::now();
        let outcome = Checkpointer::reconcile_startup(now, now - chrono::Duration::minutes(5));
        assert_eq!(outcome, ReconciliationOutcome::StoreWins);
    }
}
