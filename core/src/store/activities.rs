//! Activities table: an append-only audit log of what the agent did (§3).

use super::json_table::{encode_cursor, JsonTable, Page};
use crate::util::{new_id, now};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub action: String,
    pub details: serde_json::Value,
    pub session_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
pub struct ActivityFilters {
    pub session_id: Option<String>,
    pub action: Option<String>,
}

pub struct ActivitiesTable {
    inner: JsonTable<Activity>,
}

impl ActivitiesTable {
    pub fn open(root: &std::path::Path) -> crate::error::Result<Self> {
        Ok(Self {
            inner: JsonTable::open(root.join("activities.json"))?,
        })
    }

    pub fn append(
        &self,
        action: impl Into<String>,
        details: serde_json::Value,
        session_id: Option<String>,
    ) -> crate::error::Result<Activity> {
        let activity = Activity {
            id: new_id("act_"),
            action: action.into(),
            details,
            session_id,
            created_at: now(),
        };
        let clone = activity.clone();
        self.inner.mutate(|rows| rows.push(activity))?;
        Ok(clone)
    }

    pub fn list(
        &self,
        filters: &ActivityFilters,
        cursor: Option<&str>,
        limit: usize,
    ) -> Page<Activity> {
        self.inner.with_rows(|rows| {
            let mut matched: Vec<Activity> = rows
                .iter()
                .filter(|a| {
                    filters
                        .session_id
                        .as_deref()
                        .map_or(true, |s| a.session_id.as_deref() == Some(s))
                })
                .filter(|a| filters.action.as_deref().map_or(true, |act| a.action == act))
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let start = cursor
                .and_then(super::json_table::decode_cursor)
                .and_then(|(_, id)| matched.iter().position(|a| a.id == id))
                .map(|idx| idx + 1)
                .unwrap_or(0);

            let page: Vec<Activity> = matched.iter().skip(start).take(limit).cloned().collect();
            let next_cursor = if start + page.len() < matched.len() {
                page.last().map(|a| encode_cursor(a.created_at, &a.id))
            } else {
                None
            };
            Page {
                items: page,
                next_cursor,
            }
        })
    }
}
