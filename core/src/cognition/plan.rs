//! Skill plan (§4.5 step 5): an explicit, pre-declared list of skill
//! invocations rather than a chain of implicit callbacks. Each step
//! carries its own inputs and a success predicate; a failed non-critical
//! step is skipped, a failed critical step aborts the plan.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Succeeded,
    Failed,
    Skipped,
}

/// A success predicate evaluated against the step's `InvokeOutcome` data.
/// `Ok` means "the envelope's `ok` flag is enough"; `JsonPath` is reserved
/// for richer predicates once a step needs to inspect specific fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuccessPredicate {
    Ok,
    FieldEquals { field: String, value: Value },
}

impl SuccessPredicate {
    pub fn evaluate(&self, outcome_ok: bool, data: Option<&Value>) -> bool {
        match self {
            SuccessPredicate::Ok => outcome_ok,
            SuccessPredicate::FieldEquals { field, value } => data
                .and_then(|d| d.get(field))
                .is_some_and(|v| v == value),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub skill: String,
    pub tool: String,
    pub inputs: Value,
    pub success: SuccessPredicate,
    pub critical: bool,
    #[serde(default = "default_status")]
    pub status: StepStatus,
}

fn default_status() -> StepStatus {
    StepStatus::Pending
}

impl PlanStep {
    pub fn new(skill: impl Into<String>, tool: impl Into<String>, inputs: Value, critical: bool) -> Self {
        Self {
            skill: skill.into(),
            tool: tool.into(),
            inputs,
            success: SuccessPredicate::Ok,
            critical,
            status: StepStatus::Pending,
        }
    }
}

/// A skill plan for one pipeline pass (§4.5 step 5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillPlan {
    pub steps: Vec<PlanStep>,
}

/// Outcome of running a plan to completion or to its first critical
/// failure.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub steps: Vec<PlanStep>,
    pub aborted: bool,
}

impl SkillPlan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    /// Run each step via `invoke_one(skill, tool, inputs) -> (ok, data)`.
    /// A failed non-critical step is marked `Failed` and execution
    /// continues (§4.5 step 6); a failed critical step is marked `Failed`
    /// and remaining steps are marked `Skipped`, returning the
    /// accumulated partial result.
    pub async fn run<F, Fut>(mut self, mut invoke_one: F) -> PlanResult
    where
        F: FnMut(String, String, Value) -> Fut,
        Fut: std::future::Future<Output = (bool, Option<Value>)>,
    {
        let mut aborted = false;
        for i in 0..self.steps.len() {
            if aborted {
                self.steps[i].status = StepStatus::Skipped;
                continue;
            }
            let step = &self.steps[i];
            let (ok, data) = invoke_one(step.skill.clone(), step.tool.clone(), step.inputs.clone()).await;
            let passed = step.success.evaluate(ok, data.as_ref());
            self.steps[i].status = if passed { StepStatus::Succeeded } else { StepStatus::Failed };
            if !passed && step.critical {
                aborted = true;
            }
        }
        PlanResult {
            steps: self.steps,
            aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_non_critical_step_does_not_abort() {
        let plan = SkillPlan::new(vec![
            PlanStep::new("search", "web", Value::Null, false),
            PlanStep::new("memory", "put", Value::Null, true),
        ]);
        let result = plan
            .run(|skill, _tool, _inputs| async move { (skill != "search", None) })
            .await;
        assert!(!result.aborted);
        assert_eq!(result.steps[0].status, StepStatus::Failed);
        assert_eq!(result.steps[1].status, StepStatus::Succeeded);
    }

    #[tokio::test]
    async fn failed_critical_step_skips_remainder() {
        let plan = SkillPlan::new(vec![
            PlanStep::new("memory", "put", Value::Null, true),
            PlanStep::new("search", "web", Value::Null, false),
        ]);
        let result = plan.run(|_skill, _tool, _inputs| async move { (false, None) }).await;
        assert!(result.aborted);
        assert_eq!(result.steps[0].status, StepStatus::Failed);
        assert_eq!(result.steps[1].status, StepStatus::Skipped);
    }

    #[test]
    fn field_equals_predicate_checks_nested_value() {
        let predicate = SuccessPredicate::FieldEquals {
            field: "status".to_string(),
            value: serde_json::json!("done"),
        };
        assert!(predicate.evaluate(true, Some(&serde_json::json!({"status": "done"}))));
        assert!(!predicate.evaluate(true, Some(&serde_json::json!({"status": "pending"}))));
    }
}
