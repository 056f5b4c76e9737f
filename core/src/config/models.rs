//! Model catalog: `models.yaml`, the single source of truth for model
//! names, routing priority, and per-model provider metadata (§4.6).

use crate::error::{AriaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Per-model metadata as declared in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub provider: String,
    #[serde(default)]
    pub tool_calling: bool,
    pub context_window: u32,
    pub cost_in: f64,
    pub cost_out: f64,
    #[serde(default)]
    pub reasoning: bool,
}

/// The full model catalog: routing priority plus per-model metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub primary: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
    pub models: HashMap<String, ModelEntry>,
}

impl ModelCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let catalog: Self = super::load_yaml(path)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Every model name referenced by `primary`/`fallbacks` must exist in
    /// `models`; this is checked once at startup so a typo fails fast
    /// rather than as a runtime `UnknownModel` deep in the router.
    pub fn validate(&self) -> Result<()> {
        if !self.models.contains_key(&self.primary) {
            return Err(AriaError::UnknownModel {
                model: self.primary.clone(),
            });
        }
        for fallback in &self.fallbacks {
            if !self.models.contains_key(fallback) {
                return Err(AriaError::UnknownModel {
                    model: fallback.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn entry(&self, model: &str) -> Result<&ModelEntry> {
        self.models
            .get(model)
            .ok_or_else(|| AriaError::UnknownModel {
                model: model.to_string(),
            })
    }

    /// Ordered list of models to try for a task: primary then fallbacks.
    pub fn routing_order(&self) -> Vec<&str> {
        std::iter::once(self.primary.as_str())
            .chain(self.fallbacks.iter().map(String::as_str))
            .collect()
    }

    /// Estimated cost in micro-dollars for a call, given input/output token counts.
    pub fn estimate_cost(&self, model: &str, tokens_in: u64, tokens_out: u64) -> Result<f64> {
        let entry = self.entry(model)?;
        Ok((tokens_in as f64 / 1_000_000.0) * entry.cost_in
            + (tokens_out as f64 / 1_000_000.0) * entry.cost_out)
    }
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
    fn loads_and_validates_catalog() {
        let file = write_temp(
            r#"
primary: gpt-4o-mini
fallbacks:
  - local-llama
models:
  gpt-4o-mini:
    provider: openai
    tool_calling: true
    context_window: 128000
    cost_in: 0.15
    cost_out: 0.60
    reasoning: false
  local-llama:
    provider: local
    tool_calling: false
    context_window: 8192
    cost_in: 0.0
    cost_out: 0.0
    reasoning: false
"#,
        );
        let catalog = ModelCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.routing_order(), vec!["gpt-4o-mini", "local-llama"]);
        assert!(catalog.entry("gpt-4o-mini").unwrap().tool_calling);
    }

    #[test]
    fn unknown_primary_fails_validation() {
        let file = write_temp(
            r#"
primary: does-not-exist
fallbacks: []
models: {}
"#,
        );
        let err = ModelCatalog::load(file.path()).unwrap_err();
        assert!(matches!(err, AriaError::UnknownModel { .. }));
    }

    #[test]
    fn estimate_cost_uses_per_million_rates() {
        let file = write_temp(
            r#"
primary: m
fallbacks: []
models:
  m:
    provider: x
    tool_calling: false
    context_window: 1000
    cost_in: 1.0
    cost_out: 2.0
    reasoning: false
"#,
        );
        let catalog = ModelCatalog::load(file.path()).unwrap();
        let cost = catalog.estimate_cost("m", 1_000_000, 500_000).unwrap();
        assert!((cost - 2.0).abs() < 1e-9);
    }
}
