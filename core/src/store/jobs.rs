//! Jobs table: operational state for scheduled jobs (§4.7, §11 resolution).
//!
//! `jobs.yaml` (loaded by `crate::scheduler`) is the declarative source of
//! truth for schedule/action/delivery/enabled; this table holds only what
//! changes at runtime, so the two can never drift.

use super::json_table::JsonTable;
use crate::util::now;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: String,
    pub last_run_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
    pub next_run_at: Option<chrono::DateTime<chrono::Utc>>,
    /// `{job_id}:{scheduled_at_minute}` of the last dispatch, used by the
    /// scheduler to dedupe accidental double dispatch (§4.3).
    #[serde(default)]
    pub last_idempotency_key: Option<String>,
}

pub struct JobsTable {
    inner: JsonTable<JobState>,
}

impl JobsTable {
    pub fn open(root: &std::path::Path) -> crate::error::Result<Self> {
        Ok(Self {
            inner: JsonTable::open(root.join("jobs.json"))?,
        })
    }

    pub fn upsert(&self, job_id: &str, next_run_at: Option<chrono::DateTime<chrono::Utc>>) -> crate::error::Result<JobState> {
        self.inner.mutate(|rows| {
            if let Some(existing) = rows.iter_mut().find(|j| j.job_id == job_id) {
                existing.next_run_at = next_run_at;
                return existing.clone();
            }
            let state = JobState {
                job_id: job_id.to_string(),
                last_run_at: None,
                last_error: None,
                next_run_at,
                last_idempotency_key: None,
            };
            rows.push(state.clone());
            state
        })
    }

    pub fn list(&self) -> Vec<JobState> {
        self.inner.with_rows(|rows| rows.to_vec())
    }

    pub fn get(&self, job_id: &str) -> Option<JobState> {
        self.inner
            .with_rows(|rows| rows.iter().find(|j| j.job_id == job_id).cloned())
    }

    pub fn mark_last_run(
        &self,
        job_id: &str,
        error: Option<String>,
        next_run_at: Option<chrono::DateTime<chrono::Utc>>,
        idempotency_key: String,
    ) -> crate::error::Result<()> {
        self.inner.mutate(|rows| {
            if let Some(existing) = rows.iter_mut().find(|j| j.job_id == job_id) {
                existing.last_run_at = Some(now());
                existing.last_error = error;
                existing.next_run_at = next_run_at;
                existing.last_idempotency_key = Some(idempotency_key);
            } else {
                rows.push(JobState {
                    job_id: job_id.to_string(),
                    last_run_at: Some(now()),
                    last_error: error,
                    next_run_at,
                    last_idempotency_key: Some(idempotency_key),
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aria-jobs-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn mark_last_run_records_error() {
        let dir = temp_dir();
        let table = JobsTable::open(&dir).unwrap();
        table.upsert("daily_digest", None).unwrap();
        table
            .mark_last_run(
                "daily_digest",
                Some("timeout".into()),
                None,
                "daily_digest:202601010000".into(),
            )
            .unwrap();
        let state = table.get("daily_digest").unwrap();
        assert!(state.last_run_at.is_some());
        assert_eq!(state.last_error.as_deref(), Some("timeout"));
    let _ = std::fs::remove_dir_all(&dir);
    }
}
