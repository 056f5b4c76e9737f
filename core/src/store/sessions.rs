//! Sessions table (§3, §4.4). The protection invariant itself lives in
//! `crate::session::manager`; this table is dumb storage.

use super::json_table::JsonTable;
use crate::error::{AriaError, Result};
use crate::util::now;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Main,
    Subagent,
    Cron,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Completed,
    Pruned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub session_id: String,
    pub kind: SessionKind,
    pub parent_session_id: Option<String>,
    pub agent_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_active_at: chrono::DateTime<chrono::Utc>,
    pub state: SessionState,
}

pub struct SessionsTable {
    inner: JsonTable<SessionRow>,
}

impl SessionsTable {
    pub fn open(root: &std::path::Path) -> Result<Self> {
        Ok(Self {
            inner: JsonTable::open(root.join("sessions.json"))?,
        })
    }

    pub fn upsert(
        &self,
        session_id: &str,
        kind: SessionKind,
        parent_session_id: Option<String>,
        agent_id: &str,
    ) -> Result<SessionRow> {
        self.inner.mutate(|rows| {
            if let Some(row) = rows.iter_mut().find(|r| r.session_id == session_id) {
                row.last_active_at = now();
                return row.clone();
            }
            let timestamp = now();
            let row = SessionRow {
                session_id: session_id.to_string(),
                kind,
                parent_session_id,
                agent_id: agent_id.to_string(),
                created_at: timestamp,
                last_active_at: timestamp,
                state: SessionState::Active,
            };
            rows.push(row.clone());
            row
        })
    }

    pub fn fetch_state(&self, session_id: &str) -> Option<SessionRow> {
        self.inner
            .with_rows(|rows| rows.iter().find(|r| r.session_id == session_id).cloned())
    }

    pub fn list(&self, active_within_minutes: Option<i64>) -> Vec<SessionRow> {
        self.inner.with_rows(|rows| {
            let threshold = active_within_minutes
                .map(|minutes| now() - chrono::Duration::minutes(minutes));
            rows.iter()
                .filter(|r| match threshold {
                    Some(t) => r.last_active_at >= t,
                    None => true,
                })
                .cloned()
                .collect()
        })
    }

    pub fn mark_pruned(&self, session_id: &str) -> Result<()> {
        self.inner.mutate(|rows| {
            let row = rows
                .iter_mut()
                .find(|r| r.session_id == session_id)
                .ok_or_else(|| AriaError::NotFound {
                    what: format!("session {session_id}"),
                })?;
            if row.kind == SessionKind::Main {
                return Err(AriaError::Protected {
                    session_id: session_id.to_string(),
                });
            }
            row.state = SessionState::Pruned;
            Ok(())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aria-sessions-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn mark_pruned_refuses_main_session() {
        let dir = temp_dir();
        let table = SessionsTable::open(&dir).unwrap();
        table
            .upsert("S_main", SessionKind::Main, None, "agent-coordinator")
            .unwrap();
        let err = table.mark_pruned("S_main").unwrap_err();
        assert!(matches!(err, AriaError::Protected { .. }));
        let row = table.fetch_state("S_main").unwrap();
        assert_eq!(row.state, SessionState::Active);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn upsert_is_idempotent_on_session_id() {
        let dir = temp_dir();
        let table = SessionsTable::open(&dir).unwrap();
        table
            .upsert("s1", SessionKind::Subagent, None, "agent-coder")
            .unwrap();
        table
            .upsert("s1", SessionKind::Subagent, None, "agent-coder")
            .unwrap();
        assert_eq!(table.list(None).len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
