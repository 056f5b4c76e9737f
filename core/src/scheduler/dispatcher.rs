//! Heartbeat scheduler dispatch loop (§4.3): drives the config's
//! declarative jobs through the skill registry on a fixed tick.

use super::cron::{next_after, parse_schedule};
use super::job::{DeliveryPolicy, JobCommand, JobsConfig, ScheduledJob};
use crate::error::Result;
use crate::skills::SkillRegistry;
use crate::store::{ActivitiesTable, JobsTable};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_HARD_TIMEOUT: Duration = Duration::from_secs(120);
const TICK_INTERVAL: Duration = Duration::from_secs(30);

pub struct HeartbeatScheduler {
    config: JobsConfig,
    job_state: Arc<JobsTable>,
    registry: Arc<SkillRegistry>,
    activities: Arc<ActivitiesTable>,
    hard_timeout: Duration,
}

impl HeartbeatScheduler {
    pub fn new(
        config: JobsConfig,
        job_state: Arc<JobsTable>,
        registry: Arc<SkillRegistry>,
        activities: Arc<ActivitiesTable>,
    ) -> Self {
        Self {
            config,
            job_state,
            registry,
            activities,
            hard_timeout: DEFAULT_HARD_TIMEOUT,
        }
    }

    /// The declarative job config this scheduler was booted with, for
    /// operator tooling (`aria jobs list`) to inspect alongside runtime state.
    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Run forever, ticking on `TICK_INTERVAL`. Intended to be spawned as
    /// its own task by `Core`.
    pub async fn run_forever(&self) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One dispatch pass: find due jobs, run them in `last_run_at` order
    /// (nulls first), and persist the outcome (§4.3 "Scheduling model").
    pub async fn tick(&self) {
        let now = crate::util::now();
        let mut due: Vec<(&ScheduledJob, Option<DateTime<Utc>>, DateTime<Utc>)> = Vec::new();

        for job in &self.config.jobs {
            if !job.enabled {
                continue;
            }
            let schedule = match parse_schedule(&job.schedule) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(job = %job.job_id, error = %e, "invalid job schedule, skipping");
                    continue;
                }
            };
            let state = self.job_state.get(&job.job_id);
            let last_run_at = state.as_ref().and_then(|s| s.last_run_at);
            let anchor = last_run_at.unwrap_or(now - chrono::Duration::days(1));
            let Some(scheduled_at) = next_after(&schedule, anchor) else {
                continue;
            };
            if scheduled_at <= now {
                due.push((job, last_run_at, scheduled_at));
            }
        }

        due.sort_by_key(|(_, last_run_at, _)| *last_run_at);

        for (job, _, scheduled_at) in due {
            self.dispatch_one(job, scheduled_at, now).await;
        }
    }

    async fn dispatch_one(&self, job: &ScheduledJob, scheduled_at: DateTime<Utc>, now: DateTime<Utc>) {
        // Idempotency key dedupes accidental double dispatch within the
        // same scheduled minute (§4.3).
        let idempotency_key = format!("{}:{}", job.job_id, scheduled_at.format("%Y%m%dT%H%M"));
        if let Some(state) = self.job_state.get(&job.job_id) {
            if state.last_idempotency_key.as_deref() == Some(idempotency_key.as_str()) {
                return;
            }
        }

        tracing::info!(job = %job.job_id, scheduled_at = %scheduled_at, "dispatching scheduled job");

        let outcome = tokio::time::timeout(self.hard_timeout, self.execute(&job.command)).await;

        let (success, error) = match outcome {
            Ok(Ok(())) => (true, None),
            Ok(Err(e)) => (false, Some(e.to_string())),
            Err(_) => (false, Some(format!("timed out after {:?}", self.hard_timeout))),
        };

        let schedule = parse_schedule(&job.schedule).ok();
        let next_run_at = schedule.and_then(|s| next_after(&s, now));
        if let Err(e) = self
            .job_state
            .mark_last_run(&job.job_id, error.clone(), next_run_at, idempotency_key)
        {
            tracing::error!(job = %job.job_id, error = %e, "failed to persist job state");
        }

        self.deliver(job, success, error.as_deref());
    }

    fn execute<'a>(
        &'a self,
        command: &'a JobCommand,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            match command {
                JobCommand::Skill { skill, tool, args } => {
                    self.registry.invoke(skill, tool, args.clone(), None).await?;
                    Ok(())
                }
                JobCommand::Composite { steps } => {
                    for step in steps {
                        self.execute(step).await?;
                    }
                    Ok(())
                }
            }
        })
    }

    fn deliver(&self, job: &ScheduledJob, success: bool, error: Option<&str>) {
        let announce = match job.delivery {
            DeliveryPolicy::Announce => true,
            DeliveryPolicy::None => false,
            DeliveryPolicy::ErrorOnly => !success,
        };
        if !announce {
            return;
        }
        let details: Value = serde_json::json!({
            "job_id": job.job_id,
            "success": success,
            "error": error,
        });
        if let Err(e) = self.activities.append("scheduled_job_run", details, None) {
            tracing::error!(job = %job.job_id, error = %e, "failed to record job activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::job::{JobsConfig, ScheduledJob};
    use crate::skills::{ParamSpec, Skill, SkillLayer, SkillStatus, ToolSpec};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSkill(Arc<AtomicUsize>);

    #[async_trait]
    impl Skill for CountingSkill {
        fn name(&self) -> &str {
            "counter"
        }
        fn layer(&self) -> SkillLayer {
            SkillLayer::Domain
        }
        fn tools(&self) -> Vec<ToolSpec> {
            vec![ToolSpec {
                name: "bump".to_string(),
                description: String::new(),
                parameters: vec![],
                handler_params: vec![],
            }]
        }
        async fn health_check(&self) -> Result<SkillStatus> {
            Ok(SkillStatus::Available)
        }
        async fn invoke(&self, _tool: &str, _args: Value) -> Result<Value> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        }
    }

    fn temp_dir(label: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("aria-scheduler-{label}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn due_job_runs_exactly_once_per_tick() {
        let counter = Arc::new(AtomicUsize::new(0));
        let invocations = Arc::new(crate::store::InvocationsTable::open(&temp_dir("inv")).unwrap());
        let registry = Arc::new(SkillRegistry::new(invocations));
        registry.register(Arc::new(CountingSkill(counter.clone())), 60).unwrap();

        let job_state = Arc::new(JobsTable::open(&temp_dir("jobs")).unwrap());
        let activities = Arc::new(ActivitiesTable::open(&temp_dir("act")).unwrap());

        let config = JobsConfig {
            jobs: vec![ScheduledJob {
                job_id: "tick_job".to_string(),
                name: "tick job".to_string(),
                description: None,
                schedule: "every 1m".to_string(),
                command: JobCommand::Skill {
                    skill: "counter".to_string(),
                    tool: "bump".to_string(),
                    args: Value::Null,
                },
                delivery: DeliveryPolicy::Announce,
                enabled: true,
            }],
        };

        let scheduler = HeartbeatScheduler::new(config, job_state, registry, activities);
        scheduler.tick().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_job_never_dispatches() {
        let counter = Arc::new(AtomicUsize::new(0));
        let invocations = Arc::new(crate::store::InvocationsTable::open(&temp_dir("inv2")).unwrap());
        let registry = Arc::new(SkillRegistry::new(invocations));
        registry.register(Arc::new(CountingSkill(counter.clone())), 60).unwrap();

        let job_state = Arc::new(JobsTable::open(&temp_dir("jobs2")).unwrap());
        let activities = Arc::new(ActivitiesTable::open(&temp_dir("act2")).unwrap());

        let config = JobsConfig {
            jobs: vec![ScheduledJob {
                job_id: "off_job".to_string(),
                name: "off job".to_string(),
                description: None,
                schedule: "every 1m".to_string(),
                command: JobCommand::Skill {
                    skill: "counter".to_string(),
                    tool: "bump".to_string(),
                    args: Value::Null,
                },
                delivery: DeliveryPolicy::Announce,
                enabled: false,
            }],
        };

        let scheduler = HeartbeatScheduler::new(config, job_state, registry, activities);
        scheduler.tick().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
