//! Knowledge-graph skill (§4.7, §8): entity/relation upserts and bounded
//! graph traversal, backed directly by `KnowledgeTable`.

use super::skill::{ParamSpec, Skill, SkillLayer, SkillStatus, ToolSpec};
use crate::error::{AriaError, Result};
use crate::store::KnowledgeTable;
use async_trait::async_trait;
use std::sync::Arc;

pub struct KnowledgeGraphSkill {
    knowledge: Arc<KnowledgeTable>,
}

impl KnowledgeGraphSkill {
    pub fn new(knowledge: Arc<KnowledgeTable>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Skill for KnowledgeGraphSkill {
    fn name(&self) -> &str {
        "knowledge_graph"
    }

    fn layer(&self) -> SkillLayer {
        SkillLayer::Domain
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: "create_entity".to_string(),
                description: "Upsert a knowledge-graph entity by name and type".to_string(),
                parameters: vec![
                    ParamSpec {
                        name: "name".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "entity_type".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "properties".to_string(),
                        type_name: "object".to_string(),
                        required: false,
                    },
                ],
                handler_params: vec![
                    "name".to_string(),
                    "entity_type".to_string(),
                    "properties".to_string(),
                ],
            },
            ToolSpec {
                name: "create_relation".to_string(),
                description: "Upsert a relation between two previously created entities".to_string(),
                parameters: vec![
                    ParamSpec {
                        name: "from_id".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "to_id".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "relation_type".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "properties".to_string(),
                        type_name: "object".to_string(),
                        required: false,
                    },
                ],
                handler_params: vec![
                    "from_id".to_string(),
                    "to_id".to_string(),
                    "relation_type".to_string(),
                    "properties".to_string(),
                ],
            },
            ToolSpec {
                name: "traverse".to_string(),
                description: "Breadth-first walk from an entity, bounded by depth".to_string(),
                parameters: vec![
                    ParamSpec {
                        name: "start".to_string(),
                        type_name: "string".to_string(),
                        required: true,
                    },
                    ParamSpec {
                        name: "max_depth".to_string(),
                        type_name: "integer".to_string(),
                        required: false,
                    },
                    ParamSpec {
                        name: "relation_type".to_string(),
                        type_name: "string".to_string(),
                        required: false,
                    },
                ],
                handler_params: vec![
                    "start".to_string(),
                    "max_depth".to_string(),
                    "relation_type".to_string(),
                ],
            },
        ]
    }

    async fn health_check(&self) -> Result<SkillStatus> {
        Ok(SkillStatus::Available)
    }

    async fn invoke(&self, tool: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        match tool {
            "create_entity" => {
                let name = arg_str(&args, "name")?;
                let entity_type = arg_str(&args, "entity_type")?;
                let properties = args.get("properties").cloned().unwrap_or(serde_json::json!({}));
                let entity = self.knowledge.upsert_entity(&name, &entity_type, properties, false)?;
                Ok(serde_json::to_value(entity)?)
            }
            "create_relation" => {
                let from_id = arg_str(&args, "from_id")?;
                let to_id = arg_str(&args, "to_id")?;
                let relation_type = arg_str(&args, "relation_type")?;
                let properties = args.get("properties").cloned().unwrap_or(serde_json::json!({}));
                let relation = self
                    .knowledge
                    .upsert_relation(&from_id, &to_id, &relation_type, properties, false)?;
                Ok(serde_json::to_value(relation)?)
            }
            "traverse" => {
                let start = arg_str(&args, "start")?;
                let max_depth = args.get("max_depth").and_then(|v| v.as_u64()).unwrap_or(3) as usize;
                let relation_type = args.get("relation_type").and_then(|v| v.as_str());
                let entities = self.knowledge.traverse(&start, max_depth, relation_type);
                Ok(serde_json::to_value(entities)?)
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
