//! Working-memory skill (§3, §4.4): the `put`/`get` tools the pipeline
//! and scheduler jobs invoke through the registry rather than touching
//! `WorkingMemoryTable` directly, so every write is rate-limited and
//! audited the same way any other skill call is.

use super::skill::{ParamSpec, Skill, SkillLayer, SkillStatus, ToolSpec};
use crate::error::{AriaError, Result};
use crate::store::WorkingMemoryTable;
use async_trait::async_trait;
use std::sync::Arc;

pub struct MemorySkill {
    working_memory: Arc<WorkingMemoryTable>,
}

impl MemorySkill {
    pub fn new(working_memory: Arc<WorkingMemoryTable>) -> Self {
        Self { working_memory }
    }
}

#[async_trait]
impl Skill for MemorySkill {
    fn name(&self) -> &str {
        "memory"
    }

    fn layer(&self) -> SkillLayer {
        SkillLayer::Core
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: "put".to_string(),
                description: "Write a working-memory item scoped to a session".to_string(),
                parameters: vec![
                    ParamSpec {
                        name: "key".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "value".to_string(),
                        type_name: "any".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "category".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "importance".to_string(),
                        type_name: "number".to_string(),
                        required: false,
                    },
                    ParamSpec {
                        name: "session_id".to_string(),
                        type_name: "string".to_string(),
                        required: false,
                    },
                ],
                handler_params: vec![
                    "key".to_string(),
                    "value".to_string(),
                    "category".to_string(),
                    "importance".to_string(),
                    "session_id".to_string(),
                ],
            },
            ToolSpec {
                name: "get".to_string(),
                description: "Read a working-memory item by key".to_string(),
                parameters: vec![
                    ParamSpec {
                        name: "key".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "session_id".to_string(),
                        type_name: "string".to_string(),
                        required: false,
                    },
                ],
                handler_params: vec!["key".to_string(), "session_id".to_string()],
            },
        ]
    }

    async fn health_check(&self) -> Result<SkillStatus> {
        Ok(SkillStatus::Available)
    }

    async fn invoke(&self, tool: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        match tool {
            "put" => {
                let key = arg_str(&args, "key")?;
                let value = args.get("value").cloned().unwrap_or(serde_json::Value::Null);
                let category = arg_str(&args, "category")?;
                let importance = args.get("importance").and_then(|v| v.as_f64()).unwrap_or(0.5);
                let session_id = args.get("session_id").and_then(|v| v.as_str()).map(|s| s.to_string());
                let item = self.working_memory.put(&key, value, &category, importance, session_id)?;
                Ok(serde_json::to_value(item)?)
            }
            "get" => {
                let key = arg_str(&args, "key")?;
                let session_id = args.get("session_id").and_then(|v| v.as_str());
                let item = self.working_memory.get(&key, session_id)?;
                Ok(serde_json::to_value(item)?)
            }
            other => Err(AriaError::ToolNotFound {
                skill: self.name().to_string(),
                tool: other.to_string(),
            }),
        }
    }
}

fn arg_str(args: &serde_json::Value, key: &str) -> Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| AriaError::InvalidToolArguments {
            tool: key.to_string(),
            reason: format!("missing or non-string '{key}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_skill() -> MemorySkill {
        let dir = std::env::temp_dir().join(format!("aria-memory-skill-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        MemorySkill::new(Arc::new(WorkingMemoryTable::open(&dir).unwrap()))
    }

    #[test]
    fn tool_schemas_match_handler_params() {
        let skill = temp_skill();
        for tool in skill.tools() {
            crate::skills::validate_tool_schema("memory", &tool).unwrap();
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let skill = temp_skill();
        skill
            .invoke(
                "put",
                serde_json::json!({"key": "k", "value": "v", "category": "context", "session_id": "s1"}),
            )
            .await
            .unwrap();
        let fetched = skill
            .invoke("get", serde_json::json!({"key": "k", "session_id": "s1"}))
            .await
            .unwrap();
        assert_eq!(fetched["value"], "v");
    }

    #[tokio::test]
    async fn missing_required_key_is_rejected() {
        let skill = temp_skill();
        let err = skill.invoke("put", serde_json::json!({"value": "v"})).await.unwrap_err();
        assert!(matches!(err, AriaError::InvalidToolArguments { .. }));
    }
}
