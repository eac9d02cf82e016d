//! CLI command implementations
//!
//! This module contains the implementations for all CLI commands that
//! map to the public analysis API.

use std::path::PathBuf;
use std::process::Command;

use crate::cli::{
    config::{CliConfig, CliFileConfig, ConfigFile, TopologyFileConfig},
    errors::{CliError, CliResult},
    output::{exit_code, format_analysis, format_comparison, print_output},
};
use crate::counters::catalog;
use crate::report::Theme;

/// Top-level CLI commands
#[derive(Debug)]
pub enum Commands {
    /// Analyze one recorded counter file
    Report {
        file: PathBuf,
        no_insights: bool,
    },
    /// Compare a baseline recording against a candidate
    Compare {
        baseline: PathBuf,
        candidate: PathBuf,
    },
    /// Run a command under `perf stat` and analyze the result
    Record {
        output: PathBuf,
        events: Option<String>,
        command: Vec<String>,
    },
    /// Configuration management
    Config {
        action: ConfigAction,
    },
}

#[derive(Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Generate { output: PathBuf },
}

/// Execute a CLI command, returning the process exit code.
pub fn execute_command(command: Commands, config: CliConfig) -> CliResult<i32> {
    let (cli_config, engine) = config.load_and_merge()?;
    let theme = Theme {
        color: !cli_config.no_color,
    };

    match command {
        Commands::Report { file, no_insights } => {
            let analysis = engine.analyze_file(&file)?;
            let text = format_analysis(&analysis, &cli_config.output_format, !no_insights, &theme);
            print_output(&text, &cli_config.output_format, cli_config.quiet);
            Ok(exit_code(&analysis))
        }
        Commands::Compare {
            baseline,
            candidate,
        } => {
            let result = engine.compare_files(&baseline, &candidate)?;
            let text = format_comparison(&result, &cli_config.output_format, &theme);
            print_output(&text, &cli_config.output_format, cli_config.quiet);
            Ok(0)
        }
        Commands::Record {
            output,
            events,
            command,
        } => {
            record_run(&output, events.as_deref(), &command)?;
            let analysis = engine.analyze_file(&output)?;
            let text = format_analysis(&analysis, &cli_config.output_format, true, &theme);
            print_output(&text, &cli_config.output_format, cli_config.quiet);
            Ok(exit_code(&analysis))
        }
        Commands::Config { action } => {
            execute_config_command(action, &cli_config, &engine)?;
            Ok(0)
        }
    }
}

/// Run the workload under `perf stat`, writing counters to `output`.
fn record_run(output: &PathBuf, events: Option<&str>, command: &[String]) -> CliResult<()> {
    if command.is_empty() {
        return Err(CliError::ArgumentError(
            "no command given to record; usage: record -o out.txt -- <command>".to_string(),
        ));
    }

    let event_list = match events {
        Some(events) => events.to_string(),
        None => catalog::recording_events().join(","),
    };
    log::info!("recording {:?} with events {}", command, event_list);

    let status = Command::new("perf")
        .arg("stat")
        .arg("-e")
        .arg(&event_list)
        .arg("-o")
        .arg(output)
        .arg("--")
        .args(command)
        .status()
        .map_err(|e| CliError::PerfError(format!("failed to launch perf: {}", e)))?;

    // perf still writes whatever it could count when the workload
    // itself fails, so a nonzero workload exit is only logged.
    if !status.success() {
        log::warn!("recorded command exited with {}", status);
    }
    Ok(())
}

fn execute_config_command(
    action: ConfigAction,
    cli_config: &CliConfig,
    engine: &crate::perflens::PerfLens,
) -> CliResult<()> {
    match action {
        ConfigAction::Show => {
            // Print the configuration as merged: file values, CLI
            // overrides, and detected topology all applied.
            let topology = engine.topology();
            let config = ConfigFile {
                thresholds: engine.thresholds().clone(),
                compare: engine.compare_thresholds().clone(),
                topology: TopologyFileConfig {
                    l2_kb: Some(topology.l2_kb),
                    l3_kb: Some(topology.l3_kb),
                    line_bytes: Some(topology.line_bytes),
                },
                cli: CliFileConfig {
                    output_format: None,
                    quiet: Some(cli_config.quiet),
                    no_color: Some(cli_config.no_color),
                },
            };
            let text =
                toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError(e.to_string()))?;
            print_output(&text, &cli_config.output_format, cli_config.quiet);
            Ok(())
        }
        ConfigAction::Generate { output } => {
            let config = CliConfig::generate_default_config();
            CliConfig::save_config_file(&config, &output)?;
            log::info!("wrote default configuration to {}", output.display());
            Ok(())
        }
    }
}
