//! Configuration error types.

use thiserror::Error;

/// Errors produced while reading the environment configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}
