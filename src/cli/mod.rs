//! CLI module for the counter analysis engine
//!
//! This module provides the command-line interface over the public
//! analysis API: recording, reporting, comparison, and configuration.

pub mod commands;
pub mod config;
pub mod errors;
pub mod output;
pub mod sysinfo;

// Re-export commonly used types
pub use commands::*;
pub use config::CliConfig;
pub use errors::{CliError, CliResult};
pub use output::OutputFormat;
