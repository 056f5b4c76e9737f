//! Skill registry, rate limiting, and the invocation envelope (§4.1).

mod bucket;
mod knowledge_graph;
mod memory;
mod registry;
mod skill;

pub use bucket::TokenBucket;
pub use knowledge_graph::KnowledgeGraphSkill;
pub use memory::MemorySkill;
pub use registry::{InvokeMeta, InvokeOutcome, SkillRegistry};
pub use skill::{
    validate_args, validate_tool_schema, ParamSpec, Skill, SkillDescriptor, SkillLayer,
    SkillStatus, ToolSpec,
};
