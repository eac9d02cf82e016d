//! CLI-specific error handling
//!
//! This module provides error types and handling specifically for the CLI
//! interface, mapping record and analysis errors to user-friendly messages.

use std::fmt;

use crate::record::RecordError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Counter record error (parse or lookup)
    RecordError(RecordError),
    /// Configuration error
    ConfigError(String),
    /// Input/output error
    IoError(std::io::Error),
    /// JSON parsing error
    JsonError(serde_json::Error),
    /// TOML parsing error
    TomlError(toml::de::Error),
    /// Invalid argument error
    ArgumentError(String),
    /// `perf` invocation error
    PerfError(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::RecordError(e) => write!(f, "Record error: {}", e),
            CliError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            CliError::IoError(e) => write!(f, "I/O error: {}", e),
            CliError::JsonError(e) => write!(f, "JSON error: {}", e),
            CliError::TomlError(e) => write!(f, "TOML error: {}", e),
            CliError::ArgumentError(msg) => write!(f, "Argument error: {}", msg),
            CliError::PerfError(msg) => write!(f, "perf error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::RecordError(e) => Some(e),
            CliError::IoError(e) => Some(e),
            CliError::JsonError(e) => Some(e),
            CliError::TomlError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RecordError> for CliError {
    fn from(error: RecordError) -> Self {
        CliError::RecordError(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::IoError(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::JsonError(error)
    }
}

impl From<toml::de::Error> for CliError {
    fn from(error: toml::de::Error) -> Self {
        CliError::TomlError(error)
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
