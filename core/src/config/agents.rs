//! Agent roster: `agents.yaml`, the declarative set of personas the
//! coordinator starts with (§3 "Agent", §4.2).

use crate::agent::AgentRole;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One agent's entry in the roster. `primary_model`/`fallback_model` fall
/// back to the router's catalog defaults when omitted, so an entry only
/// needs to name what makes this persona distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub agent_id: String,
    pub role: AgentRole,
    #[serde(default)]
    pub allowed_skills: HashSet<String>,
    #[serde(default)]
    pub primary_model: Option<String>,
    #[serde(default)]
    pub fallback_model: Option<String>,
    #[serde(default)]
    pub focus_tags: HashSet<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub agents: Vec<AgentDefinition>,
}

impl AgentsConfig {
    /// Load `agents.yaml`. A missing file means no personas are declared;
    /// the bootstrap falls back to a single generalist agent rather than
    /// failing startup, since an empty roster is a valid (if degenerate)
    /// configuration the same way an empty jobs descriptor is.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        super::load_yaml(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_empty_roster() {
        let config = AgentsConfig::load(Path::new("/nonexistent/agents.yaml")).unwrap();
        assert!(config.agents.is_empty());
    }

    #[test]
    fn loads_declared_agents() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(
            br#"
agents:
  - agent_id: coder
    role: coder
    allowed_skills: ["knowledge_graph"]
    focus_tags: ["rust"]
"#,
        )
        .unwrap();
        let config = AgentsConfig::load(f.path()).unwrap();
        assert_eq!(config.agents.len(), 1);
        assert_eq!(config.agents[0].agent_id, "coder");
        assert!(config.agents[0].allowed_skills.contains("knowledge_graph"));
    }
}
