use thiserror::Error;

/// Result type for formatting operations
pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Error, Debug)]
pub enum FormatError {
    /// No adapter registered under this name
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An adapter could not render its input
    #[error("Render error in '{format}': {message}")]
    Render { format: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FormatError {
    pub fn unknown_format(name: impl Into<String>) -> Self {
        Self::UnknownFormat(name.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn render(format: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Render {
            format: format.into(),
            message: msg.into(),
        }
    }
}
