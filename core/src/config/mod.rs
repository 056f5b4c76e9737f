//! Declarative configuration surfaces: the tools descriptor (§6) and the
//! model catalog (§4.6). Both load from a file, merge `ARIA_`-prefixed
//! environment overrides, and validate before the rest of the core starts.

mod agents;
mod cognition;
mod models;
mod tools;

pub use agents::{AgentDefinition, AgentsConfig};
pub use cognition::{BoundaryPolicy, CognitionConfig};
pub use models::{ModelCatalog, ModelEntry};
pub use tools::{require_secret, SkillConfigEntry, ToolsDescriptor};

use crate::error::{AriaError, Result};
use std::path::Path;

/// Resolve an `env:NAME` reference to the named environment variable's
/// value. Values that do not start with `env:` are returned unchanged.
pub fn resolve_secret(raw: &str) -> Option<String> {
    match raw.strip_prefix("env:") {
        Some(var) => std::env::var(var).ok(),
        None => Some(raw.to_string()),
    }
}

/// Load and parse a YAML config file, converting IO/parse failures into
/// `AriaError::Configuration`.
pub(crate) fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| AriaError::Configuration {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    serde_yml::from_str(&raw).map_err(|e| AriaError::Configuration {
        message: format!("failed to parse {}: {e}", path.display()),
    })
}
