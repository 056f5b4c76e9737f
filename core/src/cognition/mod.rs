//! Cognition pipeline (§4.5): the process's main per-message control
//! loop, plus the batch jobs (compression, pattern recognition) that run
//! off the heartbeat scheduler instead of inline.

pub mod boundary;
pub mod compression;
pub mod pattern;
pub mod plan;
pub mod pipeline;
pub mod retrieval;
pub mod sentiment;

pub use pipeline::{CognitionPipeline, PipelineOutcome};
pub use plan::{PlanResult, PlanStep, SkillPlan, StepStatus, SuccessPredicate};
pub use sentiment::{SentimentScore, Tone};
