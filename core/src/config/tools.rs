//! Tools descriptor: `skills.yaml`, the declarative set of enabled skills
//! and their per-skill configuration (§6).

use crate::error::{AriaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One skill's entry in the tools descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfigEntry {
    pub enabled: bool,
    #[serde(default)]
    pub api_url: Option<String>,
    /// Raw value, possibly an `env:NAME` reference; resolved once at load.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_per_minute: Option<u32>,
    /// Provider-specific keys the skill itself interprets.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Full tools descriptor, keyed by skill name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsDescriptor {
    #[serde(flatten)]
    pub skills: HashMap<String, SkillConfigEntry>,
}

impl ToolsDescriptor {
    /// Load `skills.yaml` from `path`, resolve `env:` references, and apply
    /// `ARIA_SKILL_<NAME>_ENABLED` style overrides.
    ///
    /// A skill whose `api_key` is an unresolved `env:NAME` reference is not
    /// a fatal error — it is left disabled (caller marks it `unavailable`
    /// at registration) unless it is the one top-level secret the process
    /// requires to start (the router's API key, checked separately).
    pub fn load(path: &Path) -> Result<Self> {
        let mut descriptor: Self = super::load_yaml(path)?;
        for (name, entry) in descriptor.skills.iter_mut() {
            if let Some(raw) = &entry.api_key {
                match super::resolve_secret(raw) {
                    Some(resolved) => entry.api_key = Some(resolved),
                    None => {
                        entry.enabled = false;
                        tracing::warn!(skill = %name, "secret unresolved, disabling skill");
                    }
                }
            }
            apply_env_overrides(name, entry);
        }
        Ok(descriptor)
    }

    pub fn get(&self, skill: &str) -> Option<&SkillConfigEntry> {
        self.skills.get(skill)
    }

    pub fn is_enabled(&self, skill: &str) -> bool {
        self.skills.get(skill).map(|e| e.enabled).unwrap_or(false)
    }
}

fn apply_env_overrides(skill_name: &str, entry: &mut SkillConfigEntry) {
    let upper = skill_name.to_uppercase();
    if let Ok(v) = std::env::var(format!("ARIA_SKILL_{upper}_ENABLED")) {
        entry.enabled = v.eq_ignore_ascii_case("true") || v == "1";
    }
    if let Ok(v) = std::env::var(format!("ARIA_SKILL_{upper}_MAX_PER_MINUTE")) {
        if let Ok(n) = v.parse() {
            entry.max_per_minute = Some(n);
        }
    }
}

/// Validate a declared top-level secret is present, failing startup if not.
pub fn require_secret(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| AriaError::MissingConfig {
        key: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_basic_descriptor() {
        let file = write_temp(
            r#"
knowledge_graph:
  enabled: true
  max_per_minute: 30
web_search:
  enabled: false
  api_url: "https://example.com"
"#,
        );
        let descriptor = ToolsDescriptor::load(file.path()).unwrap();
        assert!(descriptor.is_enabled("knowledge_graph"));
        assert!(!descriptor.is_enabled("web_search"));
        assert_eq!(
            descriptor.get("knowledge_graph").unwrap().max_per_minute,
            Some(30)
        );
    }

    #[test]
    fn unresolved_env_secret_disables_skill() {
        std::env::remove_var("ARIA_TEST_DEFINITELY_UNSET_KEY");
        let file = write_temp(
            r#"
web_search:
  enabled: true
  api_key: "env:ARIA_TEST_DEFINITELY_UNSET_KEY"
"#,
        );
        let descriptor = ToolsDescriptor::load(file.path()).unwrap();
        assert!(!descriptor.is_enabled("web_search"));
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = ToolsDescriptor::load(Path::new("/nonexistent/skills.yaml")).unwrap_err();
        assert!(matches!(err, AriaError::Configuration { .. }));
    }
}
