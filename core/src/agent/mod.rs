//! Agent coordinator (§4.2).

mod coordinator;
mod persona;
mod scoring;

pub use coordinator::{AgentCoordinator, DelegationResult};
pub use persona::{Agent, AgentRole, Task};
pub use scoring::{cost_efficiency_norm, recent_speed_norm, TaskOutcome};
