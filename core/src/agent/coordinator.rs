//! Multi-agent coordinator with pheromone-weighted routing (§4.2).

use super::persona::{Agent, Task};
use super::scoring::{cost_efficiency_norm, recent_speed_norm, TaskOutcome};
use crate::error::{AriaError, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

const HISTORY_WINDOW: usize = 20;
const PHEROMONE_DECAY_PER_DAY: f64 = 0.95;
const PHEROMONE_REWARD: f64 = 0.1;
const PHEROMONE_PENALTY: f64 = 0.05;

struct AgentState {
    agent: Agent,
    history: VecDeque<TaskOutcome>,
}

/// Outcome of a delegated task, reported by the caller after it actually
/// runs the work (§4.2 "Delegation primitives").
pub struct DelegationResult {
    pub agent_id: String,
    pub success: bool,
    pub used_fallback: bool,
    pub outcome: TaskOutcome,
}

pub struct AgentCoordinator {
    agents: Arc<Mutex<HashMap<String, AgentState>>>,
}

impl AgentCoordinator {
    pub fn new() -> Self {
        Self {
            agents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn register(&self, agent: Agent) {
        let mut agents = self.agents.lock();
        agents.insert(
            agent.agent_id.clone(),
            AgentState {
                agent,
                history: VecDeque::with_capacity(HISTORY_WINDOW),
            },
        );
    }

    pub fn get(&self, agent_id: &str) -> Option<Agent> {
        self.agents.lock().get(agent_id).map(|s| s.agent.clone())
    }

    /// Select the best agent for `task` (§4.2 "Selection").
    pub fn select(&self, task: &Task) -> Result<String> {
        let agents = self.agents.lock();
        let now = crate::util::now();

        let mut candidates: Vec<&AgentState> = agents
            .values()
            .filter(|s| task.required_skills.is_subset(&s.agent.allowed_skills))
            .collect();

        if candidates.is_empty() {
            return Err(AriaError::Validation {
                message: "no agent has the required skills for this task".to_string(),
            });
        }

        if !task.focus_hints.is_empty() {
            let focused: Vec<&AgentState> = candidates
                .iter()
                .copied()
                .filter(|s| !s.agent.focus_tags.is_disjoint(&task.focus_hints))
                .collect();
            if !focused.is_empty() {
                candidates = focused;
            }
        }

        let scored: Vec<(f64, &AgentState)> = candidates
            .into_iter()
            .map(|state| {
                let pheromone = state.agent.decayed_pheromone(now, PHEROMONE_DECAY_PER_DAY);
                let history: Vec<TaskOutcome> = state.history.iter().copied().collect();
                let speed = recent_speed_norm(&history, None);
                let cost = cost_efficiency_norm(&history, None);
                let score = pheromone * 0.6 + speed * 0.3 + cost * 0.1;
                (score, state)
            })
            .collect();

        let max_score = scored
            .iter()
            .map(|(s, _)| *s)
            .fold(f64::MIN, f64::max);

        // Ties: most-recent success, then alphabetical agent_id.
        let mut tied: Vec<&AgentState> = scored
            .iter()
            .filter(|(s, _)| (*s - max_score).abs() < 1e-9)
            .map(|(_, state)| *state)
            .collect();
        tied.sort_by(|a, b| {
            let a_recent_success = a.history.front().is_some_and(|o| o.success);
            let b_recent_success = b.history.front().is_some_and(|o| o.success);
            b_recent_success
                .cmp(&a_recent_success)
                .then_with(|| a.agent.agent_id.cmp(&b.agent.agent_id))
        });

        Ok(tied[0].agent.agent_id.clone())
    }

    /// Update an agent's pheromone after a delegated task completes
    /// (§4.2 "Pheromone update"). Serialized per-agent via the coordinator's
    /// lock over the agent map (§5).
    pub fn record_outcome(&self, result: &DelegationResult) -> Result<()> {
        let mut agents = self.agents.lock();
        let state = agents
            .get_mut(&result.agent_id)
            .ok_or_else(|| AriaError::Validation {
                message: format!("unknown agent {}", result.agent_id),
            })?;

        let now = crate::util::now();
        let decayed = state.agent.decayed_pheromone(now, PHEROMONE_DECAY_PER_DAY);
        let delta = if result.success {
            PHEROMONE_REWARD
        } else {
            -PHEROMONE_PENALTY
        };
        state.agent.pheromone = (decayed + delta).clamp(0.0, 1.0);
        state.agent.last_update_at = now;

        if state.history.len() >= HISTORY_WINDOW {
            state.history.pop_back();
        }
        state.history.push_front(result.outcome);
        Ok(())
    }

    /// Run `work` for the selected agent, falling back to its secondary
    /// model if the primary attempt fails (§4.2 "Failure semantics").
    /// `work` receives the model name to use and returns whether it
    /// succeeded plus the task outcome to record.
    pub async fn delegate<F, Fut>(&self, task: &Task, work: F) -> Result<DelegationResult>
    where
        F: Fn(String, String) -> Fut,
        Fut: std::future::Future<Output = Result<TaskOutcome>>,
    {
        let agent_id = self.select(task)?;
        let agent = self.get(&agent_id).ok_or_else(|| AriaError::Internal {
            message: "agent disappeared between select and delegate".to_string(),
        })?;

        let primary_attempt = work(agent_id.clone(), agent.primary_model.clone()).await;
        let (success, used_fallback, mut outcome) = match primary_attempt {
            Ok(outcome) => (true, false, outcome),
            Err(_) => match work(agent_id.clone(), agent.fallback_model.clone()).await {
                Ok(outcome) => (true, true, outcome),
                Err(_) => (
                    false,
                    true,
                    TaskOutcome {
                        latency: std::time::Duration::from_millis(0),
                        tokens: 0,
                        success: false,
                    },
                ),
            },
        };
        outcome.success = success;

        let result = DelegationResult {
            agent_id,
            success,
            used_fallback,
            outcome,
        };
        self.record_outcome(&result)?;
        Ok(result)
    }

    /// Fan out `probe` to every registered agent, used sparingly (health
    /// checks) per §4.2.
    pub async fn broadcast<F, Fut>(&self, probe: F) -> Vec<(String, bool)>
    where
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let agent_ids: Vec<String> = self.agents.lock().keys().cloned().collect();
        let mut results = Vec::with_capacity(agent_ids.len());
        for agent_id in agent_ids {
            let ok = probe(agent_id.clone()).await;
            results.push((agent_id, ok));
        }
        results
    }
}

impl Default for AgentCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::persona::AgentRole;
    use std::collections::HashSet;

    fn agent(id: &str, skills: &[&str], focus: &[&str]) -> Agent {
        Agent::new(
            id,
            AgentRole::Coder,
            skills.iter().map(|s| s.to_string()).collect(),
            "primary",
            "fallback",
            focus.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn selects_only_agent_with_required_skills() {
        let coordinator = AgentCoordinator::new();
        coordinator.register(agent("a1", &["code"], &[]));
        coordinator.register(agent("a2", &["search"], &[]));

        let task = Task {
            description: "write code".into(),
            required_skills: HashSet::from(["code".to_string()]),
            focus_hints: HashSet::new(),
        };
        assert_eq!(coordinator.select(&task).unwrap(), "a1");
    }

    #[test]
    fn no_matching_agent_is_an_error() {
        let coordinator = AgentCoordinator::new();
        coordinator.register(agent("a1", &["search"], &[]));
        let task = Task {
            description: "".into(),
            required_skills: HashSet::from(["code".to_string()]),
            focus_hints: HashSet::new(),
        };
        assert!(coordinator.select(&task).is_err());
    }

    #[test]
    fn pheromone_stays_clamped_after_many_updates() {
        let coordinator = AgentCoordinator::new();
        coordinator.register(agent("a1", &[], &[]));
        for _ in 0..1000 {
            coordinator
                .record_outcome(&DelegationResult {
                    agent_id: "a1".into(),
                    success: true,
                    used_fallback: false,
                    outcome: TaskOutcome {
                        latency: std::time::Duration::from_millis(10),
                        tokens: 10,
                        success: true,
                    },
                })
                .unwrap();
        }
        let pheromone = coordinator.get("a1").unwrap().pheromone;
        assert!((0.0..=1.0).contains(&pheromone));
    }

    #[test]
    fn ties_break_alphabetically() {
        let coordinator = AgentCoordinator::new();
        coordinator.register(agent("b_agent", &[], &[]));
        coordinator.register(agent("a_agent", &[], &[]));
        let task = Task::default();
        assert_eq!(coordinator.select(&task).unwrap(), "a_agent");
    }

    #[test]
    fn ties_break_by_most_recent_success_before_agent_id() {
        let coordinator = AgentCoordinator::new();
        coordinator.register(agent("a_agent", &[], &[]));
        coordinator.register(agent("b_agent", &[], &[]));

        // Identical pheromone and identical history stats (same latency and
        // tokens) so the two agents score exactly equal; only the most
        // recent outcome's success differs, so `b_agent` must win the tie
        // despite losing alphabetically.
        {
            let mut agents = coordinator.agents.lock();
            agents.get_mut("a_agent").unwrap().history.push_front(TaskOutcome {
                latency: std::time::Duration::from_millis(10),
                tokens: 10,
                success: false,
            });
            agents.get_mut("b_agent").unwrap().history.push_front(TaskOutcome {
                latency: std::time::Duration::from_millis(10),
                tokens: 10,
                success: true,
            });
        }

        let task = Task::default();
        let winner = coordinator.select(&task).unwrap();
        assert_eq!(winner, "b_agent");
    }
}
