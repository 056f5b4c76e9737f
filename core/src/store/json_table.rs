//! Shared atomic-write JSON table helper used by every relational table in
//! the store facade that doesn't need a vector index (goals, activities,
//! sessions, working memory, skill invocations, knowledge, jobs).
//!
//! Each table is a single JSON file holding a `Vec<T>`, guarded by a mutex
//! and written with temp-file-then-rename so a crash mid-write never
//! corrupts the file in place.

use crate::error::{AriaError, Result};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An in-process, file-backed table of rows of type `T`.
pub struct JsonTable<T> {
    path: PathBuf,
    rows: Mutex<Vec<T>>,
}

impl<T> JsonTable<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Load `path` if it exists, otherwise start with an empty table.
    pub fn open(path: PathBuf) -> Result<Self> {
        let rows = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    /// Run `f` over a snapshot of the current rows.
    pub fn with_rows<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let rows = self.rows.lock();
        f(&rows)
    }

    /// Mutate the rows and persist the result atomically. `f` returns a
    /// value propagated to the caller.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let mut rows = self.rows.lock();
        let result = f(&mut rows);
        self.flush_locked(&rows)?;
        Ok(result)
    }

    fn flush_locked(&self, rows: &[T]) -> Result<()> {
        atomic_write_json(&self.path, rows)
    }
}

/// Serialize `value` to pretty JSON and write it to `dest` via
/// temp-file-then-rename so a crash mid-write never corrupts `dest`.
pub fn atomic_write_json<T: Serialize>(dest: &Path, value: &T) -> Result<()> {
    let parent = dest.parent().ok_or_else(|| AriaError::Internal {
        message: format!("destination path {} has no parent", dest.display()),
    })?;
    fs::create_dir_all(parent)?;

    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = dest.with_extension(format!("tmp.{}", uuid::Uuid::new_v4()));
    fs::write(&tmp, &bytes)?;

    if let Err(err) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(AriaError::Io(err));
    }
    Ok(())
}

/// A cursor-paginated page, per §4.7 ("items, next_cursor?").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Opaque `(created_at, id)` pagination cursor, encoded as
/// `"<rfc3339>|<id>"` so it sorts the same as the tuple it represents.
pub fn encode_cursor(created_at: chrono::DateTime<chrono::Utc>, id: &str) -> String {
    format!("{}|{}", created_at.to_rfc3339(), id)
}

pub fn decode_cursor(cursor: &str) -> Option<(chrono::DateTime<chrono::Utc>, String)> {
    let (ts, id) = cursor.split_once('|')?;
    let created_at = chrono::DateTime::parse_from_rfc3339(ts)
        .ok()?
        .with_timezone(&chrono::Utc);
    Some((created_at, id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: String,
        value: i32,
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("aria-test-table-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn round_trips_rows() {
        let path = temp_path();
        let table: JsonTable<Row> = JsonTable::open(path.clone()).unwrap();
        table
            .mutate(|rows| {
                rows.push(Row {
                    id: "a".into(),
                    value: 1,
                })
            })
            .unwrap();

        let reopened: JsonTable<Row> = JsonTable::open(path.clone()).unwrap();
        reopened.with_rows(|rows| {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].value, 1);
        });
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn cursor_round_trips() {
        let now = chrono::Utc::now();
        let cursor = encode_cursor(now, "goal_123");
        let (decoded_ts, decoded_id) = decode_cursor(&cursor).unwrap();
        assert_eq!(decoded_id, "goal_123");
        assert_eq!(decoded_ts.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn missing_file_starts_empty() {
        let table: JsonTable<Row> = JsonTable::open(temp_path()).unwrap();
        table.with_rows(|rows| assert!(rows.is_empty()));
    }
}
