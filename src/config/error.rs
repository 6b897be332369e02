//! Configuration error types.

use super::violation::ValidationErrors;

/// Errors raised while loading, validating or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO-related errors (file access, permissions, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more schema violations; always carries the full list.
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Configuration file not found
    #[error("Configuration not found: {0}")]
    NotFound(String),
}

impl ConfigError {
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Validation and missing-file errors can be fixed by the user and retried.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConfigError::Io(_) => false,
            ConfigError::Toml(_) => true,
            ConfigError::TomlSer(_) => false,
            ConfigError::Json(_) => true,
            ConfigError::Validation(_) => true,
            ConfigError::NotFound(_) => true,
        }
    }

    /// The violations behind a validation failure, if that is what this is.
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            ConfigError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
