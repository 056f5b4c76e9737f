//! `recent_speed_norm` / `cost_efficiency_norm` (§4.2, §11 resolution).

use std::time::Duration;

/// One past delegated task's outcome, kept per-agent by the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct TaskOutcome {
    pub latency: Duration,
    pub tokens: u64,
    pub success: bool,
}

const DEFAULT_SLOWEST_ACCEPTABLE_MS: f64 = 30_000.0;
const DEFAULT_MAX_TOKENS_BUDGET_PER_CALL: f64 = 8_000.0;

/// `1 - clamp(mean(latency_ms over last N) / slowest_acceptable_ms, 0, 1)`.
/// Defaults to `0.5` (neutral) for a cold-start agent with no history.
pub fn recent_speed_norm(history: &[TaskOutcome], slowest_acceptable_ms: Option<f64>) -> f64 {
    if history.is_empty() {
        return 0.5;
    }
    let slowest = slowest_acceptable_ms.unwrap_or(DEFAULT_SLOWEST_ACCEPTABLE_MS);
    let mean_ms =
        history.iter().map(|o| o.latency.as_millis() as f64).sum::<f64>() / history.len() as f64;
    1.0 - (mean_ms / slowest).clamp(0.0, 1.0)
}

/// `1 - clamp(mean(tokens over last N) / max_tokens_budget_per_call, 0, 1)`.
/// Defaults to `0.5` for a cold-start agent with no history.
pub fn cost_efficiency_norm(history: &[TaskOutcome], max_tokens_budget: Option<f64>) -> f64 {
    if history.is_empty() {
        return 0.5;
    }
    let budget = max_tokens_budget.unwrap_or(DEFAULT_MAX_TOKENS_BUDGET_PER_CALL);
    let mean_tokens =
        history.iter().map(|o| o.tokens as f64).sum::<f64>() / history.len() as f64;
    1.0 - (mean_tokens / budget).clamp(0.0, 1.0)
}
