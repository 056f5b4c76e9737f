//! Agent persona definitions (§3 "Agent", §GLOSSARY "Focus / persona").

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Coordinator,
    Coder,
    Analyst,
    Creator,
    Memory,
}

/// A task to be routed to an agent (§4.2).
#[derive(Debug, Clone, Default)]
pub struct Task {
    pub description: String,
    pub required_skills: HashSet<String>,
    pub focus_hints: HashSet<String>,
}

/// A persona definition identified by `agent_id` (§3). Pheromone state is
/// mutated only by the coordinator, serialized per-agent by the
/// coordinator's per-agent mutex (§5 "Shared-resource policy").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub role: AgentRole,
    pub allowed_skills: HashSet<String>,
    pub primary_model: String,
    pub fallback_model: String,
    pub focus_tags: HashSet<String>,
    pub pheromone: f64,
    pub last_update_at: chrono::DateTime<chrono::Utc>,
}

impl Agent {
    pub fn new(
        agent_id: impl Into<String>,
        role: AgentRole,
        allowed_skills: HashSet<String>,
        primary_model: impl Into<String>,
        fallback_model: impl Into<String>,
        focus_tags: HashSet<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            role,
            allowed_skills,
            primary_model: primary_model.into(),
            fallback_model: fallback_model.into(),
            focus_tags,
            pheromone: 0.5,
            last_update_at: crate::util::now(),
        }
    }

    /// `pheromone`, decayed from `last_update_at` to `at` (§9 "Pheromone
    /// decay" — interpolated on read, never by a background sweep).
    pub fn decayed_pheromone(&self, at: chrono::DateTime<chrono::Utc>, decay_per_day: f64) -> f64 {
        let elapsed_days = (at - self.last_update_at).num_milliseconds() as f64
            / (1000.0 * 60.0 * 60.0 * 24.0);
        if elapsed_days <= 0.0 {
            return self.pheromone;
        }
        (self.pheromone * decay_per_day.powf(elapsed_days)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_reduces_pheromone_over_time() {
        let mut agent = Agent::new(
            "a1",
            AgentRole::Coder,
            HashSet::new(),
            "primary",
            "fallback",
            HashSet::new(),
        );
        agent.pheromone = 1.0;
        agent.last_update_at = crate::util::now() - chrono::Duration::days(2);
        let decayed = agent.decayed_pheromone(crate::util::now(), 0.95);
        assert!(decayed < 1.0);
        assert!((decayed - 0.95_f64.powi(2)).abs() < 1e-9);
    }

    #[test]
    fn no_elapsed_time_returns_current_value() {
        let agent = Agent::new(
            "a1",
            AgentRole::Coder,
            HashSet::new(),
            "p",
            "f",
            HashSet::new(),
        );
        assert_eq!(agent.decayed_pheromone(agent.last_update_at, 0.95), 0.5);
    }
}
