//! Error types for configuration and table handling

use thiserror::Error;

/// Result type for core operations
pub type ComResult<T> = Result<T, ComError>;

/// Errors raised while loading or validating the build-time tables
#[derive(Debug, Error)]
pub enum ComError {
    /// Reference to a name that no table defines
    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },

    /// Two entries of one table share a name
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// Table exceeds the 16-bit handle space
    #[error("{table} table has {len} entries, limit is 65535")]
    TableTooLarge { table: &'static str, len: usize },

    /// Inconsistent configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
