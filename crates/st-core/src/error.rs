//! Error types for st-core

use thiserror::Error;

/// Core error type for Strata
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E101: A migration-source location could not be listed
    #[error("[E101] Cannot read migrations location '{path}': {source}")]
    Discovery {
        path: String,
        source: std::io::Error,
    },

    /// E102: A string is not a 14-digit version key
    #[error("[E102] Invalid migration version '{value}': expected 14 digits (YYYYMMDDHHMMSS)")]
    InvalidVersion { value: String },

    /// E103: A migration script could not be read
    #[error("[E103] Failed to read migration script '{path}': {source}")]
    ScriptRead {
        path: String,
        source: std::io::Error,
    },

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
