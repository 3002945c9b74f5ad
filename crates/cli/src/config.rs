//! `context-map.toml`: parser and format settings plus project rules and flows.

use anyhow::{Context, Result};
use context_code_parser::ParserConfig;
use context_format::{Flow, FormatConfig, Rule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "context-map.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub parser: ParserConfig,
    pub format: FormatConfig,
    pub rules: Vec<Rule>,
    pub flows: Vec<Flow>,
}

impl AppConfig {
    /// Load `path`, or the default file when present. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!(
            "Loaded {} ({} rules, {} flows)",
            path.display(),
            config.rules.len(),
            config.flows.len()
        );
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.parser
            .validate()
            .map_err(|e| anyhow::anyhow!("[parser] {e}"))?;
        self.format
            .validate()
            .map_err(|e| anyhow::anyhow!("[format] {e}"))?;
        for rule in &self.rules {
            if rule.rule_type.trim().is_empty() {
                anyhow::bail!("[[rules]] entries need a non-empty type");
            }
            if rule.confidence.is_some_and(|c| !(0.0..=1.0).contains(&c)) {
                anyhow::bail!("rule '{}': confidence must be within 0.0..=1.0", rule.rule_type);
            }
        }
        for flow in &self.flows {
            if flow.name.trim().is_empty() || flow.steps.is_empty() {
                anyhow::bail!("[[flows]] entries need a name and at least one step");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_every_table() {
        let config = AppConfig::from_toml(
            r#"
[parser]
include_comments = true

[format]
compact_threshold_tokens = 1000
default_format = "aiccl"

[[rules]]
type = "naming"
confidence = 0.9
guidance = "use verbs for functions"

[[flows]]
name = "startup"
steps = ["main", "fetchAll"]
"#,
        )
        .unwrap();
        assert!(config.parser.include_comments);
        assert_eq!(config.format.compact_threshold_tokens, 1000);
        assert_eq!(config.format.default_format, "aiccl");
        assert_eq!(config.format.default_token_budget, 8000);
        assert_eq!(config.rules[0].rule_type, "naming");
        assert_eq!(config.flows[0].steps, vec!["main", "fetchAll"]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_toml("[format]\ndefault_token_budget = 0\n").is_err());
        assert!(AppConfig::from_toml("[[rules]]\ntype = \"x\"\nconfidence = 2.0\n").is_err());
        assert!(AppConfig::from_toml("[[flows]]\nname = \"empty\"\nsteps = []\n").is_err());
    }

    #[test]
    fn missing_default_file_means_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(AppConfig::load(Some(Path::new("/nonexistent/context-map.toml"))).is_err());
    }
}
