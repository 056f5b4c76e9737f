//! Skill registry (§4.1): owns all skill instances, exposes a single
//! invocation entry point, enforces rate limits, produces uniform result
//! envelopes.
//!
//! Uses a read-mostly `RwLock<HashMap<...>>` holding `Arc<dyn Skill>`,
//! which is both `Clone` and safely callable without holding the lock
//! across the invocation's I/O.

use super::bucket::TokenBucket;
use super::skill::{
    find_tool, tool_names_unique, validate_args, validate_tool_schema, Skill, SkillDescriptor,
    SkillStatus,
};
use crate::error::{AriaError, Result};
use crate::store::{InvocationsTable, SkillInvocationRecord};
use crate::util::{hash_args, now};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

struct RegisteredSkill {
    skill: Arc<dyn Skill>,
    status: parking_lot::Mutex<SkillStatus>,
    bucket: TokenBucket,
}

/// Outcome of `invoke`, carrying the envelope metadata §4.1 requires.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvokeMeta {
    pub latency_ms: u64,
    pub tokens: Option<u64>,
    pub rate_limited: bool,
    pub retries: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct InvokeOutcome {
    pub ok: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub meta: InvokeMeta,
}

pub struct SkillRegistry {
    skills: RwLock<HashMap<String, RegisteredSkill>>,
    invocations: Arc<InvocationsTable>,
}

impl SkillRegistry {
    pub fn new(invocations: Arc<InvocationsTable>) -> Self {
        Self {
            skills: RwLock::new(HashMap::new()),
            invocations,
        }
    }

    /// Register a skill. Fails startup (via the caller propagating the
    /// error) on duplicate names or a tool schema/handler mismatch.
    pub fn register(&self, skill: Arc<dyn Skill>, max_per_minute: u32) -> Result<()> {
        let name = skill.name().to_string();
        {
            let skills = self.skills.read();
            if skills.contains_key(&name) {
                return Err(AriaError::DuplicateSkill { skill: name });
            }
        }

        let tools = skill.tools();
        tool_names_unique(&name, &tools)?;
        for tool in &tools {
            validate_tool_schema(&name, tool)?;
        }

        let mut skills = self.skills.write();
        skills.insert(
            name,
            RegisteredSkill {
                skill,
                status: parking_lot::Mutex::new(SkillStatus::Available),
                bucket: TokenBucket::new(max_per_minute.max(1)),
            },
        );
        Ok(())
    }

    /// Stable order by name (§4.1).
    pub fn list(&self) -> Vec<SkillDescriptor> {
        let skills = self.skills.read();
        let mut descriptors: Vec<SkillDescriptor> = skills
            .iter()
            .map(|(name, entry)| SkillDescriptor {
                name: name.clone(),
                layer: entry.skill.layer(),
                status: *entry.status.lock(),
                tools: entry.skill.tools().into_iter().map(|t| t.name).collect(),
                max_per_minute: 0,
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Skill>> {
        self.skills
            .read()
            .get(name)
            .map(|entry| entry.skill.clone())
            .ok_or_else(|| AriaError::SkillNotFound {
                skill: name.to_string(),
            })
    }

    /// Run the skill's health probe and update its recorded status.
    pub async fn health_check(&self, name: &str) -> Result<SkillStatus> {
        let skill = self.get(name)?;
        let status = skill.health_check().await?;
        if let Some(entry) = self.skills.read().get(name) {
            *entry.status.lock() = status;
        }
        Ok(status)
    }

    /// The single invocation entry point (§4.1).
    pub async fn invoke(
        &self,
        name: &str,
        tool: &str,
        args: serde_json::Value,
        session_id: Option<String>,
    ) -> Result<InvokeOutcome> {
        let status = {
            let skills = self.skills.read();
            let entry = skills
                .get(name)
                .ok_or_else(|| AriaError::SkillNotFound {
                    skill: name.to_string(),
                })?;
            *entry.status.lock()
        };
        if status != SkillStatus::Available {
            return Err(AriaError::Unavailable {
                skill: name.to_string(),
            });
        }

        let (skill, bucket_ok, retry_after) = {
            let skills = self.skills.read();
            let entry = skills
                .get(name)
                .ok_or_else(|| AriaError::SkillNotFound {
                    skill: name.to_string(),
                })?;
            let ok = entry.bucket.try_consume();
            (entry.skill.clone(), ok, entry.bucket.retry_after())
        };
        if !bucket_ok {
            return Err(AriaError::RateLimited {
                skill: name.to_string(),
                retry_after,
            });
        }

        let tools = skill.tools();
        let tool_spec = find_tool(&tools, tool).ok_or_else(|| AriaError::ToolNotFound {
            skill: name.to_string(),
            tool: tool.to_string(),
        })?;
        validate_args(tool_spec, &args)?;

        let args_hash = hash_args(&args);
        let started_at = now();
        let start = Instant::now();
        let result = skill.invoke(tool, args.clone()).await;
        let latency_ms = start.elapsed().as_millis() as u64;
        let ended_at = now();

        let (ok, data, error) = match &result {
            Ok(value) => (true, Some(value.clone()), None),
            Err(e) => (false, None, Some(e.to_string())),
        };

        self.record_invocation(SkillInvocationRecord {
            id: crate::util::new_id("inv_"),
            skill: name.to_string(),
            tool: tool.to_string(),
            args_hash,
            success: ok,
            latency_ms,
            tokens: None,
            error: error.clone(),
            session_id,
            started_at,
            ended_at,
        });

        Ok(InvokeOutcome {
            ok,
            data,
            error,
            meta: InvokeMeta {
                latency_ms,
                tokens: None,
                rate_limited: false,
                retries: 0,
            },
        })
    }

    /// Persist the audit row; failure to persist must not fail the
    /// invocation (§4.1 Observability) — it is logged and dropped rather
    /// than retried indefinitely, since the in-process `InvocationsTable`
    /// write is itself already durable (atomic file write); a background
    /// flusher is only meaningful for a remote store.
    fn record_invocation(&self, record: SkillInvocationRecord) {
        let SkillInvocationRecord {
            skill,
            tool,
            args_hash,
            success,
            latency_ms,
            tokens,
            error,
            session_id,
            started_at,
            ended_at,
            ..
        } = record;
        if let Err(e) = self.invocations.append(
            &skill, &tool, args_hash, success, latency_ms, tokens, error, session_id, started_at,
            ended_at,
        ) {
            tracing::error!(error = %e, skill = %skill, tool = %tool, "failed to persist invocation audit row");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::skill::{ParamSpec, ToolSpec};
    use async_trait::async_trait;

    struct EchoSkill;

    #[async_trait]
    impl Skill for EchoSkill {
        fn name(&self) -> &str {
            "echo"
        }
        fn layer(&self) -> crate::skills::skill::SkillLayer {
            crate::skills::skill::SkillLayer::Domain
        }
        fn tools(&self) -> Vec<ToolSpec> {
            vec![ToolSpec {
                name: "say".to_string(),
                description: "echo back".to_string(),
                parameters: vec![ParamSpec {
                    name: "text".to_string(),
                    type_name: "string".to_string(),
                    required: true,
                }],
                handler_params: vec!["text".to_string()],
            }]
        }
        async fn health_check(&self) -> Result<SkillStatus> {
            Ok(SkillStatus::Available)
        }
        async fn invoke(&self, _tool: &str, args: serde_json::Value) -> Result<serde_json::Value> {
            Ok(args)
        }
    }

    fn temp_invocations() -> Arc<InvocationsTable> {
        let dir = std::env::temp_dir().join(format!("aria-registry-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Arc::new(InvocationsTable::open(&dir).unwrap())
    }

    #[tokio::test]
    async fn invoke_round_trips_through_echo_skill() {
        let registry = SkillRegistry::new(temp_invocations());
        registry.register(Arc::new(EchoSkill), 60).unwrap();
        let outcome = registry
            .invoke("echo", "say", serde_json::json!({"text": "hi"}), None)
            .await
            .unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.data.unwrap()["text"], "hi");
    }

    #[tokio::test]
    async fn invoke_unknown_skill_not_found() {
        let registry = SkillRegistry::new(temp_invocations());
        let err = registry
            .invoke("nope", "say", serde_json::json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AriaError::SkillNotFound { .. }));
    }

    #[tokio::test]
    async fn invoke_unknown_tool_not_found() {
        let registry = SkillRegistry::new(temp_invocations());
        registry.register(Arc::new(EchoSkill), 60).unwrap();
        let err = registry
            .invoke("echo", "nope", serde_json::json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AriaError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let registry = SkillRegistry::new(temp_invocations());
        registry.register(Arc::new(EchoSkill), 60).unwrap();
        let err = registry.register(Arc::new(EchoSkill), 60).unwrap_err();
        assert!(matches!(err, AriaError::DuplicateSkill { .. }));
    }

    #[tokio::test]
    async fn rate_limit_exhausts_bucket() {
        let registry = SkillRegistry::new(temp_invocations());
        registry.register(Arc::new(EchoSkill), 1).unwrap();
        registry
            .invoke("echo", "say", serde_json::json!({"text": "1"}), None)
            .await
            .unwrap();
        let err = registry
            .invoke("echo", "say", serde_json::json!({"text": "2"}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AriaError::RateLimited { .. }));
    }
}
