use thiserror::Error;

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParserError>;

/// Errors raised inside a parser run.
///
/// These never cross the [`LanguageParser`](crate::LanguageParser) boundary: component
/// detection degrades to the file root and relationship detection keeps partial results.
#[derive(Error, Debug)]
pub enum ParserError {
    /// Tree-sitter refused the grammar or produced no tree
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// Unsupported language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Input exceeds the configured size limit
    #[error("Content too large: {size} bytes (limit {limit})")]
    ContentTooLarge { size: usize, limit: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A relationship pass could not finish
    #[error("Relationship pass '{pass}' failed: {message}")]
    PassFailed { pass: &'static str, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ParserError {
    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a pass failure
    pub fn pass(pass: &'static str, msg: impl Into<String>) -> Self {
        Self::PassFailed {
            pass,
            message: msg.into(),
        }
    }
}
