//! Skill invocation audit table (§3 "Tool invocation record", §4.1
//! Observability). Append-only.

use super::json_table::JsonTable;
use crate::util::new_id;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInvocationRecord {
    pub id: String,
    pub skill: String,
    pub tool: String,
    pub args_hash: String,
    pub success: bool,
    pub latency_ms: u64,
    pub tokens: Option<u64>,
    pub error: Option<String>,
    pub session_id: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ended_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
pub struct InvocationFilters {
    pub skill: Option<String>,
    pub session_id: Option<String>,
    pub success: Option<bool>,
}

pub struct InvocationsTable {
    inner: JsonTable<SkillInvocationRecord>,
}

impl InvocationsTable {
    pub fn open(root: &std::path::Path) -> crate::error::Result<Self> {
        Ok(Self {
            inner: JsonTable::open(root.join("skill_invocations.json"))?,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn append(
        &self,
        skill: &str,
        tool: &str,
        args_hash: String,
        success: bool,
        latency_ms: u64,
        tokens: Option<u64>,
        error: Option<String>,
        session_id: Option<String>,
        started_at: chrono::DateTime<chrono::Utc>,
        ended_at: chrono::DateTime<chrono::Utc>,
    ) -> crate::error::Result<SkillInvocationRecord> {
        let record = SkillInvocationRecord {
            id: new_id("inv_"),
            skill: skill.to_string(),
            tool: tool.to_string(),
            args_hash,
            success,
            latency_ms,
            tokens,
            error,
            session_id,
            started_at,
            ended_at,
        };
        let clone = record.clone();
        self.inner.mutate(|rows| rows.push(record))?;
        Ok(clone)
    }

    pub fn list(&self, filters: &InvocationFilters) -> Vec<SkillInvocationRecord> {
        self.inner.with_rows(|rows| {
            rows.iter()
                .filter(|r| filters.skill.as_deref().map_or(true, |s| r.skill == s))
                .filter(|r| {
                    filters
                        .session_id
                        .as_deref()
                        .map_or(true, |s| r.session_id.as_deref() == Some(s))
                })
                .filter(|r| filters.success.map_or(true, |s| r.success == s))
                .cloned()
                .collect()
        })
    }

    /// Last `n` invocations for `skill`, most recent first — used by the
    /// coordinator's `recent_speed_norm`/`cost_efficiency_norm` scoring.
    pub fn recent_for_skill(&self, skill: &str, n: usize) -> Vec<SkillInvocationRecord> {
        self.inner.with_rows(|rows| {
            let mut matched: Vec<SkillInvocationRecord> =
                rows.iter().filter(|r| r.skill == skill).cloned().collect();
            matched.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            matched.truncate(n);
            matched
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aria-invocations-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn append_then_recent_for_skill_orders_newest_first() {
        let dir = temp_dir();
        let table = InvocationsTable::open(&dir).unwrap();
        let t0 = crate::util::now();
        table
            .append(
                "web_search",
                "query",
                "h1".into(),
                true,
                10,
                None,
                None,
                None,
                t0,
                t0,
            )
            .unwrap();
        let t1 = t0 + chrono::Duration::seconds(1);
        table
            .append(
                "web_search",
                "query",
                "h2".into(),
                true,
                20,
                None,
                None,
                None,
                t1,
                t1,
            )
            .unwrap();

        let recent = table.recent_for_skill("web_search", 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].args_hash, "h2");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
