//! The `Skill` contract (§9 "tagged variants + registries"): fixed
//! methods, a value-typed descriptor, and declarative tool schemas
//! validated at registration rather than by reflection.

use crate::error::{AriaError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Architectural tier, used to reason about allowed dependencies (higher
/// may call lower, never vice versa). §11 resolves the 0..4 numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SkillLayer {
    Kernel = 0,
    Gateway = 1,
    Core = 2,
    Domain = 3,
    Orchestration = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    Available,
    Unavailable,
    RateLimited,
    Error,
}

/// A single declared parameter of a tool's JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub type_name: String,
    pub required: bool,
}

/// A callable operation exposed by a skill (§GLOSSARY "Tool").
///
/// `handler_params` is the Rust-side canonical parameter list the
/// `invoke` implementation actually reads out of the `args` JSON. It is
/// declared independently of `parameters` (the externally-facing schema)
/// so the registry can catch a signature-vs-schema mismatch at
/// registration, the single most important preventive check (§4.1).
#[derive(Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
    pub handler_params: Vec<String>,
}

/// A skill's static descriptor, as returned by `SkillRegistry::list()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    pub layer: SkillLayer,
    pub status: SkillStatus,
    pub tools: Vec<String>,
    pub max_per_minute: u32,
}

/// A capability module. Implementors own their own I/O (HTTP client,
/// process handle, etc.); the registry only ever calls through this
/// trait.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique lowercase name, e.g. `knowledge_graph`.
    fn name(&self) -> &str;

    fn layer(&self) -> SkillLayer;

    /// Declared tool list. Invariant: tool names are unique within a skill.
    fn tools(&self) -> Vec<ToolSpec>;

    /// Probe the skill's health; used by `health_check` to transition
    /// `available <-> unavailable/error`.
    async fn health_check(&self) -> Result<SkillStatus>;

    /// Invoke `tool` with `args`, already validated against its schema.
    async fn invoke(&self, tool: &str, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// Validate, at registration time, that every tool's `parameters` names
/// match its `handler_params` exactly (same set, order-independent).
/// Returns the first mismatched parameter name for a clear error message.
pub fn validate_tool_schema(skill: &str, tool: &ToolSpec) -> Result<()> {
    let declared: std::collections::HashSet<&str> =
        tool.parameters.iter().map(|p| p.name.as_str()).collect();
    let handler: std::collections::HashSet<&str> =
        tool.handler_params.iter().map(String::as_str).collect();

    if let Some(extra) = handler.difference(&declared).next() {
        return Err(AriaError::SchemaMismatch {
            skill: skill.to_string(),
            tool: tool.name.clone(),
            parameter: extra.to_string(),
        });
    }
    if let Some(missing) = declared.difference(&handler).next() {
        return Err(AriaError::SchemaMismatch {
            skill: skill.to_string(),
            tool: tool.name.clone(),
            parameter: missing.to_string(),
        });
    }
    Ok(())
}

/// Validate `args` against `tool`'s declared schema: required-ness and
/// the presence of each key. Unknown keys are preserved and forwarded
/// (§4.1 "Tie-breaks and edge cases").
pub fn validate_args(tool: &ToolSpec, args: &serde_json::Value) -> Result<()> {
    let obj = args.as_object().ok_or_else(|| AriaError::InvalidToolArguments {
        tool: tool.name.clone(),
        reason: "arguments must be a JSON object".to_string(),
    })?;
    for param in &tool.parameters {
        if param.required && !obj.contains_key(&param.name) {
            return Err(AriaError::InvalidToolArguments {
                tool: tool.name.clone(),
                reason: format!("missing required parameter '{}'", param.name),
            });
        }
    }
    Ok(())
}

/// Look up a tool by name within a skill's declared tool list.
pub fn find_tool<'a>(tools: &'a [ToolSpec], name: &str) -> Option<&'a ToolSpec> {
    tools.iter().find(|t| t.name == name)
}

/// Map a skill's tool list into the descriptor's `tools` field, checked
/// for within-skill uniqueness (§3 invariant).
pub fn tool_names_unique(skill: &str, tools: &[ToolSpec]) -> Result<Vec<String>> {
    let mut seen = HashMap::new();
    let mut names = Vec::with_capacity(tools.len());
    for tool in tools {
        if seen.insert(tool.name.clone(), ()).is_some() {
            return Err(AriaError::Validation {
                message: format!("skill {skill} declares tool '{}' twice", tool.name),
            });
        }
        names.push(tool.name.clone());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(params: &[&str], handler: &[&str]) -> ToolSpec {
        ToolSpec {
            name: "create_relation".to_string(),
            description: String::new(),
            parameters: params
                .iter()
                .map(|p| ParamSpec {
                    name: p.to_string(),
                    type_name: "string".to_string(),
                    required: true,
                })
                .collect(),
            handler_params: handler.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn matching_schema_and_handler_passes() {
        let tool = spec(&["from_entity"], &["from_entity"]);
        assert!(validate_tool_schema("knowledge_graph", &tool).is_ok());
    }

    #[test]
    fn mismatched_param_names_fail_with_offending_name() {
        let tool = spec(&["from_entity"], &["from_entity_name"]);
        let err = validate_tool_schema("knowledge_graph", &tool).unwrap_err();
        match err {
            AriaError::SchemaMismatch { parameter, .. } => {
                assert!(parameter == "from_entity" || parameter == "from_entity_name");
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_arg_rejected() {
        let tool = spec(&["from_entity"], &["from_entity"]);
        let err = validate_args(&tool, &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, AriaError::InvalidToolArguments { .. }));
    }

    #[test]
    fn unknown_keys_are_not_rejected() {
        let tool = spec(&["from_entity"], &["from_entity"]);
        let args = serde_json::json!({"from_entity": "a", "extra": 1});
        assert!(validate_args(&tool, &args).is_ok());
    }

    #[test]
    fn duplicate_tool_names_rejected() {
        let tools = vec![spec(&["a"], &["a"]), spec(&["a"], &["a"])];
        assert!(tool_names_unique("s", &tools).is_err());
    }
}
