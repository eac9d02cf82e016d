//! CLI configuration management
//!
//! This module handles CLI configuration, including loading threshold
//! and topology overrides from files and merging them with command-line
//! arguments.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analysis::{AnalysisThresholds, CacheTopology, CompareThresholds};
use crate::cli::{errors::CliResult, output::OutputFormat, sysinfo};
use crate::perflens::PerfLens;

/// CLI configuration structure
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Configuration file path
    pub config_file: Option<PathBuf>,
    /// L2 capacity override in KiB
    pub l2_kb: Option<u64>,
    /// L3 capacity override in KiB
    pub l3_kb: Option<u64>,
    /// Output format
    pub output_format: OutputFormat,
    /// Quiet mode
    pub quiet: bool,
    /// Disable ANSI colors
    pub no_color: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            l2_kb: None,
            l3_kb: None,
            output_format: OutputFormat::Human,
            quiet: false,
            no_color: false,
        }
    }
}

/// Configuration file format
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Analysis thresholds (every field optional via serde defaults)
    #[serde(default)]
    pub thresholds: AnalysisThresholds,
    /// Comparison thresholds
    #[serde(default)]
    pub compare: CompareThresholds,
    /// Cache topology overrides
    #[serde(default)]
    pub topology: TopologyFileConfig,
    /// CLI defaults
    #[serde(default)]
    pub cli: CliFileConfig,
}

/// Topology overrides in file format
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TopologyFileConfig {
    /// L2 capacity in KiB
    pub l2_kb: Option<u64>,
    /// L3 capacity in KiB
    pub l3_kb: Option<u64>,
    /// Cache line size in bytes
    pub line_bytes: Option<u64>,
}

/// CLI configuration in file format
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CliFileConfig {
    /// Default output format
    pub output_format: Option<String>,
    /// Default quiet mode
    pub quiet: Option<bool>,
    /// Default color suppression
    pub no_color: Option<bool>,
}

impl CliConfig {
    /// Load configuration from file, merge with CLI options, and build
    /// the analysis engine.
    ///
    /// Precedence for topology: command line, then config file, then
    /// sysfs detection.
    pub fn load_and_merge(mut self) -> CliResult<(Self, PerfLens)> {
        let file_config = if let Some(config_path) = &self.config_file {
            Some(Self::load_config_file(config_path)?)
        } else {
            None
        };

        let mut topology = sysinfo::detect_topology();
        let mut thresholds = AnalysisThresholds::default();
        let mut compare_thresholds = CompareThresholds::default();

        if let Some(file_config) = file_config {
            if self.output_format == OutputFormat::Human {
                if let Some(format_str) = &file_config.cli.output_format {
                    self.output_format = match format_str.as_str() {
                        "json" => OutputFormat::Json,
                        "quiet" => OutputFormat::Quiet,
                        _ => OutputFormat::Human,
                    };
                }
            }
            if !self.quiet {
                self.quiet = file_config.cli.quiet.unwrap_or(false);
            }
            if !self.no_color {
                self.no_color = file_config.cli.no_color.unwrap_or(false);
            }

            if let Some(l2_kb) = file_config.topology.l2_kb {
                topology.l2_kb = l2_kb;
            }
            if let Some(l3_kb) = file_config.topology.l3_kb {
                topology.l3_kb = l3_kb;
            }
            if let Some(line_bytes) = file_config.topology.line_bytes {
                topology.line_bytes = line_bytes;
            }

            thresholds = file_config.thresholds;
            compare_thresholds = file_config.compare;
        }

        // Command-line overrides win over file and detection.
        if let Some(l2_kb) = self.l2_kb {
            topology.l2_kb = l2_kb;
        }
        if let Some(l3_kb) = self.l3_kb {
            topology.l3_kb = l3_kb;
        }

        let engine = PerfLens::builder()
            .topology(topology)
            .thresholds(thresholds)
            .compare_thresholds(compare_thresholds)
            .build();

        Ok((self, engine))
    }

    /// Load configuration from file
    fn load_config_file(path: &PathBuf) -> CliResult<ConfigFile> {
        let content = std::fs::read_to_string(path)?;

        // Determine format based on extension
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            // Default to TOML
            Ok(toml::from_str(&content)?)
        }
    }

    /// Generate default configuration file contents
    pub fn generate_default_config() -> ConfigFile {
        ConfigFile {
            thresholds: AnalysisThresholds::default(),
            compare: CompareThresholds::default(),
            topology: TopologyFileConfig {
                l2_kb: None,
                l3_kb: None,
                line_bytes: Some(CacheTopology::default().line_bytes),
            },
            cli: CliFileConfig {
                output_format: Some("human".to_string()),
                quiet: Some(false),
                no_color: Some(false),
            },
        }
    }

    /// Save configuration to file
    pub fn save_config_file(config: &ConfigFile, path: &PathBuf) -> CliResult<()> {
        let content = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::to_string_pretty(config)?
        } else {
            toml::to_string_pretty(config).map_err(std::io::Error::other)?
        };

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = CliConfig::generate_default_config();
        let toml_text = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_text).unwrap();
        assert_eq!(
            parsed.thresholds.stall_warn_pct,
            config.thresholds.stall_warn_pct
        );
        assert_eq!(parsed.topology.line_bytes, Some(64));
    }

    #[test]
    fn partial_config_file_keeps_threshold_defaults() {
        let parsed: ConfigFile = toml::from_str(
            "[thresholds]\nipc_warn = 0.8\n\n[topology]\nl2_kb = 2048\n",
        )
        .unwrap();
        assert_eq!(parsed.thresholds.ipc_warn, 0.8);
        assert_eq!(parsed.thresholds.ipc_good, 1.0);
        assert_eq!(parsed.topology.l2_kb, Some(2048));
        assert_eq!(parsed.cli.quiet, None);
    }

    #[test]
    fn cli_topology_override_beats_config_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("perflens_cli_config_test.toml");
        std::fs::write(&path, "[topology]\nl2_kb = 256\n").unwrap();
        let config = CliConfig {
            config_file: Some(path.clone()),
            l2_kb: Some(4096),
            ..Default::default()
        };
        let (_, engine) = config.load_and_merge().unwrap();
        assert_eq!(engine.topology().l2_kb, 4096);
        let _ = std::fs::remove_file(&path);
    }
}
