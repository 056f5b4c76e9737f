//! Session manager (§4.4): create/track/delete sessions, delegating
//! storage to `store::SessionsTable` and enforcing the protection
//! invariant against deleting the process's main session.

use crate::error::{AriaError, Result};
use crate::store::{ActivitiesTable, SessionKind, SessionRow, SessionsTable, WorkingMemoryTable};
use crate::util::new_id;
use std::sync::Arc;

pub struct SessionManager {
    sessions: Arc<SessionsTable>,
    working_memory: Arc<WorkingMemoryTable>,
    activities: Arc<ActivitiesTable>,
    main_session_id: String,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<SessionsTable>,
        working_memory: Arc<WorkingMemoryTable>,
        activities: Arc<ActivitiesTable>,
        main_session_id: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            working_memory,
            activities,
            main_session_id: main_session_id.into(),
        }
    }

    /// Create (or reuse, if `session_id` already exists) a session and
    /// record it as active.
    pub fn create(
        &self,
        session_id: &str,
        kind: SessionKind,
        agent_id: &str,
        parent_session_id: Option<String>,
    ) -> Result<SessionRow> {
        self.sessions.upsert(session_id, kind, parent_session_id, agent_id)
    }

    /// Ensure the durable main session exists, creating it on first boot.
    pub fn ensure_main_session(&self, agent_id: &str) -> Result<SessionRow> {
        self.create(&self.main_session_id, SessionKind::Main, agent_id, None)
    }

    pub fn main_session_id(&self) -> &str {
        &self.main_session_id
    }

    pub fn get(&self, session_id: &str) -> Option<SessionRow> {
        self.sessions.fetch_state(session_id)
    }

    pub fn list_active(&self, active_within_minutes: Option<i64>) -> Vec<SessionRow> {
        self.sessions.list(active_within_minutes)
    }

    /// `delete(session_id)` (§4.4 "Deletion flow"): refuse protected
    /// sessions, mark pruned, hard-delete working memory, emit an audit
    /// row. Cancelling in-flight tasks rooted at this session is the
    /// caller's responsibility (the coordinator owns task lifetimes); this
    /// only tears down session state.
    pub fn delete(&self, session_id: &str) -> Result<()> {
        if session_id == self.main_session_id {
            return Err(AriaError::Protected {
                session_id: session_id.to_string(),
            });
        }
        self.sessions.mark_pruned(session_id)?;
        self.working_memory.delete_session(session_id)?;

        self.activities.append(
            "session_deleted",
            serde_json::json!({"session_id": session_id}),
            Some(session_id.to_string()),
        )?;
        Ok(())
    }

    /// Sweep sessions inactive for longer than `max_age_minutes`, excluding
    /// protected ones, and delete them (§4.4).
    pub fn prune(&self, max_age_minutes: i64) -> Result<usize> {
        let cutoff = crate::util::now() - chrono::Duration::minutes(max_age_minutes);
        let stale: Vec<SessionRow> = self
            .sessions
            .list(None)
            .into_iter()
            .filter(|s| s.last_active_at < cutoff && s.session_id != self.main_session_id)
            .collect();
        let mut pruned = 0;
        for session in stale {
            if self.delete(&session.session_id).is_ok() {
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    pub fn new_subagent_session_id(&self) -> String {
        new_id("sess_sub_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness() -> (SessionManager, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("aria-session-mgr-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let sessions = Arc::new(SessionsTable::open(&dir).unwrap());
        let working_memory = Arc::new(WorkingMemoryTable::open(&dir).unwrap());
        let activities = Arc::new(ActivitiesTable::open(&dir).unwrap());
        let manager = SessionManager::new(sessions, working_memory, activities, "S_main");
        (manager, dir)
    }

    #[test]
    fn deleting_main_session_is_protected() {
        let (manager, dir) = harness();
        manager.ensure_main_session("agent-coordinator").unwrap();
        let err = manager.delete("S_main").unwrap_err();
        assert!(matches!(err, AriaError::Protected { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn delete_removes_working_memory_and_marks_pruned() {
        let (manager, dir) = harness();
        manager.create("s1", SessionKind::Subagent, "agent-coder", None).unwrap();
        manager
            .working_memory
            .put("k", serde_json::json!(1), "c", 0.1, Some("s1".into()))
            .unwrap();
        manager.delete("s1").unwrap();
        assert_eq!(manager.working_memory.for_session(Some("s1")).len(), 0);
        assert_eq!(manager.get("s1").unwrap().state, crate::store::SessionState::Pruned);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn prune_excludes_main_session() {
        let (manager, dir) = harness();
        manager.ensure_main_session("agent-coordinator").unwrap();
        let pruned = manager.prune(-1).unwrap();
        assert_eq!(pruned, 0);
        assert!(manager.get("S_main").is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
