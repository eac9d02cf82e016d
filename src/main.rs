//! perflens binary entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use perflens::cli::{
    commands::{Commands, ConfigAction},
    config::CliConfig,
    output::{print_error, OutputFormat},
};

#[derive(Parser, Debug)]
#[command(
    name = "perflens",
    version,
    about = "Analyze hardware performance-counter recordings",
    long_about = "Parses perf-stat style counter output, computes derived metrics \
                  (IPC, cache hit rates, FLOPs, bandwidth), classifies the dominant \
                  bottleneck, and compares runs."
)]
struct Cli {
    /// Configuration file (TOML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Override detected L2 capacity in KiB
    #[arg(long, global = true)]
    l2_kb: Option<u64>,

    /// Override detected L3 capacity in KiB
    #[arg(long, global = true)]
    l3_kb: Option<u64>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Analyze a recorded counter file
    Report {
        /// Counter recording (perf stat output)
        file: PathBuf,
        /// Skip insight evaluation and the bottleneck summary
        #[arg(long)]
        no_insights: bool,
    },
    /// Compare a baseline recording against a candidate
    Compare {
        /// Baseline recording
        baseline: PathBuf,
        /// Candidate recording
        candidate: PathBuf,
    },
    /// Run a command under `perf stat` and analyze the result
    Record {
        /// Where to write the counter recording
        #[arg(short, long, default_value = "perf-counters.txt")]
        output: PathBuf,
        /// Comma-separated event list (defaults to the built-in catalog)
        #[arg(short, long)]
        events: Option<String>,
        /// Command to run, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: CliConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum CliConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Generate {
        /// Destination path (TOML, or JSON by extension)
        #[arg(short, long, default_value = "perflens.toml")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = CliConfig {
        config_file: cli.config,
        l2_kb: cli.l2_kb,
        l3_kb: cli.l3_kb,
        output_format: cli.format,
        quiet: cli.quiet,
        no_color: cli.no_color,
    };
    let quiet = config.quiet;

    let command = match cli.command {
        CliCommand::Report { file, no_insights } => Commands::Report { file, no_insights },
        CliCommand::Compare {
            baseline,
            candidate,
        } => Commands::Compare {
            baseline,
            candidate,
        },
        CliCommand::Record {
            output,
            events,
            command,
        } => Commands::Record {
            output,
            events,
            command,
        },
        CliCommand::Config { action } => Commands::Config {
            action: match action {
                CliConfigAction::Show => ConfigAction::Show,
                CliConfigAction::Generate { output } => ConfigAction::Generate { output },
            },
        },
    };

    match perflens::cli::commands::execute_command(command, config) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&e.to_string(), quiet);
            ExitCode::from(2)
        }
    }
}
