//! Error types for the engine facade and worker

use heraclitus_domain::{StoreError, ValidationError};
use heraclitus_semantic::SemanticError;
use heraclitus_temporal::TemporalError;
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value was out of range
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// Errors surfaced by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store could not be opened
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Temporal model error
    #[error("Temporal model error: {0}")]
    Temporal(#[from] TemporalError),

    /// Semantic engine error
    #[error("Semantic engine error: {0}")]
    Semantic(#[from] SemanticError),
}
