//! Working-memory table (§3 "Working memory item", §4.4 checkpointing).
//! Long-term semantic memory lives in `crate::memory::vector`.

use super::json_table::JsonTable;
use crate::util::now;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingMemoryItem {
    pub key: String,
    pub value: serde_json::Value,
    pub category: String,
    pub importance: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub accessed_at: chrono::DateTime<chrono::Utc>,
    pub access_count: u64,
    pub session_id: Option<String>,
}

pub struct WorkingMemoryTable {
    inner: JsonTable<WorkingMemoryItem>,
}

impl WorkingMemoryTable {
    pub fn open(root: &std::path::Path) -> crate::error::Result<Self> {
        Ok(Self {
            inner: JsonTable::open(root.join("memories_working.json"))?,
        })
    }

    /// Keys are unique per session (or globally when `session_id` is `None`).
    pub fn put(
        &self,
        key: &str,
        value: serde_json::Value,
        category: &str,
        importance: f64,
        session_id: Option<String>,
    ) -> crate::error::Result<WorkingMemoryItem> {
        self.inner.mutate(|rows| {
            if let Some(existing) = rows
                .iter_mut()
                .find(|i| i.key == key && i.session_id == session_id)
            {
                existing.value = value;
                existing.category = category.to_string();
                existing.importance = importance;
                existing.accessed_at = now();
                existing.access_count += 1;
                return existing.clone();
            }
            let timestamp = now();
            let item = WorkingMemoryItem {
                key: key.to_string(),
                value,
                category: category.to_string(),
                importance,
                created_at: timestamp,
                accessed_at: timestamp,
                access_count: 0,
                session_id,
            };
            rows.push(item.clone());
            item
        })
    }

    pub fn get(&self, key: &str, session_id: Option<&str>) -> crate::error::Result<Option<WorkingMemoryItem>> {
        self.inner.mutate(|rows| {
            if let Some(item) = rows
                .iter_mut()
                .find(|i| i.key == key && i.session_id.as_deref() == session_id)
            {
                item.accessed_at = now();
                item.access_count += 1;
                Some(item.clone())
            } else {
                None
            }
        })
    }

    pub fn touch(&self, key: &str, session_id: Option<&str>) -> crate::error::Result<()> {
        self.inner.mutate(|rows| {
            if let Some(item) = rows
                .iter_mut()
                .find(|i| i.key == key && i.session_id.as_deref() == session_id)
            {
                item.accessed_at = now();
                item.access_count += 1;
            }
        })
    }

    pub fn for_session(&self, session_id: Option<&str>) -> Vec<WorkingMemoryItem> {
        self.inner.with_rows(|rows| {
            rows.iter()
                .filter(|i| i.session_id.as_deref() == session_id)
                .cloned()
                .collect()
        })
    }

    /// Prune items older than `max_age_minutes` with `importance` below
    /// `min_importance`, keeping anything above the importance floor
    /// regardless of age.
    pub fn prune(&self, max_age_minutes: i64, min_importance: f64) -> crate::error::Result<usize> {
        let cutoff = now() - chrono::Duration::minutes(max_age_minutes);
        self.inner.mutate(|rows| {
            let before = rows.len();
            rows.retain(|i| i.importance >= min_importance || i.accessed_at >= cutoff);
            before - rows.len()
        })
    }

    /// Hard-delete every item scoped to `session_id` (§4.4 "Deletion flow").
    pub fn delete_session(&self, session_id: &str) -> crate::error::Result<usize> {
        self.inner.mutate(|rows| {
            let before = rows.len();
            rows.retain(|i| i.session_id.as_deref() != Some(session_id));
            before - rows.len()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aria-memories-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn put_then_get_increments_access_count() {
        let dir = temp_dir();
        let table = WorkingMemoryTable::open(&dir).unwrap();
        table
            .put("last_topic", serde_json::json!("rust"), "context", 0.5, Some("s1".into()))
            .unwrap();
        let item = table.get("last_topic", Some("s1")).unwrap().unwrap();
        assert_eq!(item.access_count, 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn keys_are_scoped_per_session() {
        let dir = temp_dir();
        let table = WorkingMemoryTable::open(&dir).unwrap();
        table
            .put("k", serde_json::json!(1), "c", 0.1, Some("s1".into()))
            .unwrap();
        table
            .put("k", serde_json::json!(2), "c", 0.1, Some("s2".into()))
            .unwrap();
        assert_eq!(table.for_session(Some("s1")).len(), 1);
        assert_eq!(table.for_session(Some("s2")).len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn prune_keeps_important_items() {
        let dir = temp_dir();
        let table = WorkingMemoryTable::open(&dir).unwrap();
        table
            .put("stale", serde_json::json!(1), "c", 0.1, None)
            .unwrap();
        table
            .put("important", serde_json::json!(1), "c", 0.95, None)
            .unwrap();
        let removed = table.prune(-1, 0.5).unwrap();
        assert_eq!(removed, 1);
        assert!(table.for_session(None).iter().any(|i| i.key == "important"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
