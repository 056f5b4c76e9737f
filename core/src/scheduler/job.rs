//! Declarative scheduled-job config (§3 "Scheduled job"). `jobs.yaml` is
//! the source of truth for this shape; `store::JobsTable` holds only the
//! runtime half (§11 resolution).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub job_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Cron-like grammar: 5-field cron, `@hourly`/`@daily`/`@weekly`, or
    /// `every Nm`/`every Nh` (§9).
    pub schedule: String,
    pub command: JobCommand,
    #[serde(default)]
    pub delivery: DeliveryPolicy,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobCommand {
    /// `skill.tool(args)` invoked through the registry (§4.3).
    Skill {
        skill: String,
        tool: String,
        #[serde(default)]
        args: Value,
    },
    /// A composite handler calling multiple skills in order.
    Composite { steps: Vec<JobCommand> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Result summary written as an activity row and, if configured,
    /// emitted to an external channel.
    #[default]
    Announce,
    /// Persisted only.
    None,
    /// Announced only on failure.
    ErrorOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobsConfig {
    #[serde(default)]
    pub jobs: Vec<ScheduledJob>,
}

impl JobsConfig {
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        crate::config::load_yaml(path)
    }

    pub fn by_id(&self) -> HashMap<String, &ScheduledJob> {
        self.jobs.iter().map(|j| (j.job_id.clone(), j)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_skill_command() {
        let yaml = r#"
jobs:
  - job_id: daily_digest
    name: Daily digest
    schedule: "@daily"
    command:
      kind: skill
      skill: notify
      tool: send_digest
      args: {}
"#;
        let config: JobsConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.jobs.len(), 1);
        assert_eq!(config.jobs[0].delivery, DeliveryPolicy::Announce);
        assert!(matches!(config.jobs[0].command, JobCommand::Skill { .. }));
    }
}
