//! Goals table (§3, §8 "Goal ordering").

use super::json_table::{encode_cursor, JsonTable, Page};
use crate::error::{AriaError, Result};
use crate::util::{new_id, now};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    InProgress,
    Completed,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub goal_id: String,
    pub title: String,
    pub description: String,
    pub status: GoalStatus,
    /// 1 = highest priority, 5 = lowest.
    pub priority: u8,
    pub progress: u8,
    pub due_at: Option<chrono::DateTime<chrono::Utc>>,
    pub parent_goal_id: Option<String>,
    pub sprint_id: Option<String>,
    pub board_column: String,
    pub position: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
pub struct GoalFilters {
    pub status: Option<GoalStatus>,
    pub sprint_id: Option<String>,
    pub board_column: Option<String>,
}

pub struct GoalsTable {
    inner: JsonTable<Goal>,
}

impl GoalsTable {
    pub fn open(root: &std::path::Path) -> Result<Self> {
        Ok(Self {
            inner: JsonTable::open(root.join("goals.json"))?,
        })
    }

    pub fn create(
        &self,
        title: String,
        description: String,
        priority: u8,
        board_column: String,
    ) -> Result<Goal> {
        if !(1..=5).contains(&priority) {
            return Err(AriaError::Validation {
                message: format!("priority must be 1..=5, got {priority}"),
            });
        }
        let timestamp = now();
        let goal = Goal {
            goal_id: new_id("goal_"),
            title,
            description,
            status: GoalStatus::Active,
            priority,
            progress: 0,
            due_at: None,
            parent_goal_id: None,
            sprint_id: None,
            board_column,
            position: 0,
            created_at: timestamp,
            completed_at: None,
            updated_at: timestamp,
        };
        let goal_clone = goal.clone();
        self.inner.mutate(|rows| rows.push(goal))?;
        Ok(goal_clone)
    }

    pub fn get(&self, goal_id: &str) -> Option<Goal> {
        self.inner
            .with_rows(|rows| rows.iter().find(|g| g.goal_id == goal_id).cloned())
    }

    /// Returns goals matching `filters`, ordered ascending by `priority`
    /// then descending by `created_at` within ties (§8 "Goal ordering").
    pub fn list(&self, filters: &GoalFilters, cursor: Option<&str>, limit: usize) -> Page<Goal> {
        self.inner.with_rows(|rows| {
            let mut matched: Vec<Goal> = rows
                .iter()
                .filter(|g| filters.status.map_or(true, |s| g.status == s))
                .filter(|g| {
                    filters
                        .sprint_id
                        .as_deref()
                        .map_or(true, |s| g.sprint_id.as_deref() == Some(s))
                })
                .filter(|g| {
                    filters
                        .board_column
                        .as_deref()
                        .map_or(true, |c| g.board_column == c)
                })
                .cloned()
                .collect();

            matched.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });

            let start = cursor
                .and_then(super::json_table::decode_cursor)
                .and_then(|(_, id)| matched.iter().position(|g| g.goal_id == id))
                .map(|idx| idx + 1)
                .unwrap_or(0);

            let page: Vec<Goal> = matched.iter().skip(start).take(limit).cloned().collect();
            let next_cursor = if start + page.len() < matched.len() {
                page.last()
                    .map(|g| encode_cursor(g.created_at, &g.goal_id))
            } else {
                None
            };
            Page {
                items: page,
                next_cursor,
            }
        })
    }

    pub fn update_status(&self, goal_id: &str, status: GoalStatus) -> Result<()> {
        self.inner.mutate(|rows| {
            let goal = rows
                .iter_mut()
                .find(|g| g.goal_id == goal_id)
                .ok_or_else(|| AriaError::NotFound {
                    what: format!("goal {goal_id}"),
                })?;
            goal.status = status;
            goal.completed_at = if status == GoalStatus::Completed {
                Some(now())
            } else {
                None
            };
            goal.updated_at = now();
            Ok(())
        })?
    }

    pub fn update_progress(&self, goal_id: &str, progress: u8) -> Result<()> {
        let progress = progress.min(100);
        self.inner.mutate(|rows| {
            let goal = rows
                .iter_mut()
                .find(|g| g.goal_id == goal_id)
                .ok_or_else(|| AriaError::NotFound {
                    what: format!("goal {goal_id}"),
                })?;
            goal.progress = progress;
            goal.updated_at = now();
            Ok(())
        })?
    }

    pub fn move_board(&self, goal_id: &str, board_column: String, position: i64) -> Result<()> {
        self.inner.mutate(|rows| {
            let goal = rows
                .iter_mut()
                .find(|g| g.goal_id == goal_id)
                .ok_or_else(|| AriaError::NotFound {
                    what: format!("goal {goal_id}"),
                })?;
            goal.board_column = board_column;
            goal.position = position;
            goal.updated_at = now();
            Ok(())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aria-goals-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn priority_then_created_at_ordering() {
        let dir = temp_dir();
        let table = GoalsTable::open(&dir).unwrap();
        let g1 = table
            .create("G1".into(), "".into(), 3, "backlog".into())
            .unwrap();
        let g2 = table
            .create("G2".into(), "".into(), 1, "backlog".into())
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let g3 = table
            .create("G3".into(), "".into(), 1, "backlog".into())
            .unwrap();
        let g4 = table
            .create("G4".into(), "".into(), 5, "backlog".into())
            .unwrap();

        let page = table.list(&GoalFilters::default(), None, 10);
        let ids: Vec<&str> = page.items.iter().map(|g| g.goal_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                g3.goal_id.as_str(),
                g2.goal_id.as_str(),
                g1.goal_id.as_str(),
                g4.goal_id.as_str()
            ]
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn completed_at_follows_status() {
        let dir = temp_dir();
        let table = GoalsTable::open(&dir).unwrap();
        let g = table
            .create("G".into(), "".into(), 1, "backlog".into())
            .unwrap();
        table
            .update_status(&g.goal_id, GoalStatus::Completed)
            .unwrap();
        let updated = table.get(&g.goal_id).unwrap();
        assert!(updated.completed_at.is_some());

        table
            .update_status(&g.goal_id, GoalStatus::Paused)
            .unwrap();
        let updated = table.get(&g.goal_id).unwrap();
        assert!(updated.completed_at.is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
