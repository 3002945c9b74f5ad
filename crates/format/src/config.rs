use serde::{Deserialize, Serialize};

/// Configuration for context rendering and the AICCL encoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Budgets below this many tokens switch `json`/`markdown` to their compact variants
    pub compact_threshold_tokens: usize,

    /// Format used when a request names none
    pub default_format: String,

    /// Token budget used when a request names none
    pub default_token_budget: usize,

    /// Component code is cut to this many lines (0 = unlimited)
    pub max_code_lines_per_component: usize,

    /// A word must occur this often to earn an AICCL pattern code
    pub pattern_min_occurrences: usize,

    /// Shortest word considered for an AICCL pattern code
    pub pattern_min_length: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            compact_threshold_tokens: 2000,
            default_format: "markdown".to_string(),
            default_token_budget: 8000,
            max_code_lines_per_component: 60,
            pattern_min_occurrences: 3,
            pattern_min_length: 6,
        }
    }
}

impl FormatConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_format.trim().is_empty() {
            return Err("default_format must not be empty".to_string());
        }
        if self.default_token_budget == 0 {
            return Err("default_token_budget must be greater than 0".to_string());
        }
        if self.pattern_min_occurrences < 2 {
            return Err("pattern_min_occurrences must be at least 2".to_string());
        }
        // Codes are `q<n>`: shorter words would not shrink
        if self.pattern_min_length < 4 {
            return Err("pattern_min_length must be at least 4".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FormatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.compact_threshold_tokens, 2000);
    }

    #[test]
    fn rejects_degenerate_values() {
        let config = FormatConfig {
            pattern_min_length: 2,
            ..FormatConfig::default()
        };
        assert!(config.validate().is_err());
        let config = FormatConfig {
            default_token_budget: 0,
            ..FormatConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
