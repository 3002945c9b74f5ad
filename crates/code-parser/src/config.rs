use serde::{Deserialize, Serialize};

/// Configuration shared by all language parsers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Files larger than this are reduced to their file component (0 = unlimited)
    pub max_file_bytes: usize,

    /// Emit comment components for doc comments attached to declarations
    pub include_comments: bool,

    /// Emit private/protected members (methods, properties)
    pub include_private_members: bool,

    /// Fenced-code language tags that mark an index block in documentation files
    pub index_block_tags: Vec<String>,

    /// Keyword markers that make a prose element worth materializing
    pub narrative_markers: Vec<String>,

    /// Truncate component code to this many characters (0 = keep verbatim)
    pub max_code_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 2 * 1024 * 1024,
            include_comments: false,
            include_private_members: true,
            index_block_tags: vec!["codeindex".to_string(), "aiccl-index".to_string()],
            narrative_markers: [
                "TODO",
                "NOTE",
                "IMPORTANT",
                "WARNING",
                "FIXME",
                "DEPRECATED",
                "@see",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            max_code_chars: 0,
        }
    }
}

impl ParserConfig {
    /// Config for documentation-heavy repositories (keeps comments)
    pub fn for_documentation() -> Self {
        Self {
            include_comments: true,
            ..Default::default()
        }
    }

    /// Smallest useful graph: public surface only, no comments
    pub fn minimal() -> Self {
        Self {
            include_comments: false,
            include_private_members: false,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.index_block_tags.iter().any(|t| t.trim().is_empty()) {
            return Err("index_block_tags must not contain empty tags".to_string());
        }
        if self
            .index_block_tags
            .iter()
            .any(|t| t.chars().any(char::is_whitespace))
        {
            return Err("index_block_tags must be single words".to_string());
        }
        if self.narrative_markers.iter().any(|m| m.trim().is_empty()) {
            return Err("narrative_markers must not contain empty markers".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_index_tag(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.index_block_tags
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Apply `max_code_chars` to a code string
    #[must_use]
    pub fn clip_code(&self, code: &str) -> String {
        if self.max_code_chars == 0 || code.chars().count() <= self.max_code_chars {
            return code.to_string();
        }
        code.chars().take(self.max_code_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ParserConfig::default().validate().is_ok());
        assert!(ParserConfig::for_documentation().validate().is_ok());
        assert!(ParserConfig::minimal().validate().is_ok());
    }

    #[test]
    fn test_invalid_tags() {
        let mut config = ParserConfig::default();
        config.index_block_tags.push("two words".to_string());
        assert!(config.validate().is_err());

        config.index_block_tags = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_index_tag_match_is_case_insensitive() {
        let config = ParserConfig::default();
        assert!(config.is_index_tag("CodeIndex"));
        assert!(!config.is_index_tag("ts"));
    }

    #[test]
    fn test_clip_code() {
        let config = ParserConfig {
            max_code_chars: 3,
            ..Default::default()
        };
        assert_eq!(config.clip_code("abcdef"), "abc");
        assert_eq!(ParserConfig::default().clip_code("abcdef"), "abcdef");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ParserConfig =
            serde_json::from_str(r#"{"include_comments": true}"#).expect("partial config");
        assert!(config.include_comments);
        assert_eq!(config.index_block_tags.len(), 2);
    }
}
