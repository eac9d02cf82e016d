//! Output formatting for CLI commands
//!
//! This module provides the different output modes for CLI commands:
//! human-readable reports, JSON, and quiet mode.

use clap::ValueEnum;

use crate::insight::Severity;
use crate::perflens::Analysis;
use crate::report::{self, Theme};

/// Output format options
#[derive(Clone, Debug, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
    /// Quiet mode (minimal output)
    Quiet,
}

/// Format a full analysis for the selected output mode.
///
/// Quiet mode prints only the bottleneck labels, one per line, for use
/// in scripts and CI gates.
pub fn format_analysis(
    analysis: &Analysis,
    format: &OutputFormat,
    show_insights: bool,
    theme: &Theme,
) -> String {
    let insight_block = if show_insights {
        Some((analysis.insights.as_slice(), &analysis.bottlenecks))
    } else {
        None
    };
    match format {
        OutputFormat::Human => {
            report::render_analysis(&analysis.snapshot, &analysis.derived, insight_block, theme)
        }
        OutputFormat::Json => {
            let value = report::analysis_json(&analysis.snapshot, &analysis.derived, insight_block);
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Quiet => {
            let mut lines = Vec::new();
            if let Some(primary) = &analysis.bottlenecks.primary {
                lines.push(primary.clone());
            }
            if let Some(secondary) = &analysis.bottlenecks.secondary {
                lines.push(secondary.clone());
            }
            lines.join("\n")
        }
    }
}

/// Format a comparison for the selected output mode.
pub fn format_comparison(
    result: &crate::compare::ComparisonResult,
    format: &OutputFormat,
    theme: &Theme,
) -> String {
    match format {
        OutputFormat::Human => report::render_comparison(result, theme),
        OutputFormat::Json => serde_json::to_string_pretty(&report::comparison_json(result))
            .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Quiet => match result.speed {
            Some(crate::compare::SpeedChange::Speedup(f)) => format!("{:.3}", f),
            Some(crate::compare::SpeedChange::Slowdown(f)) => format!("{:.3}", 1.0 / f),
            None => "1.000".to_string(),
        },
    }
}

/// Print output based on format and quiet mode
pub fn print_output(content: &str, format: &OutputFormat, quiet: bool) {
    if quiet && !matches!(format, OutputFormat::Quiet) {
        return;
    }
    if !content.is_empty() {
        println!("{}", content);
    }
}

/// Print error message
pub fn print_error(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("Error: {}", message);
    }
}

/// Exit-status contract: warnings found means a nonzero exit so CI
/// jobs can gate on a clean profile.
pub fn exit_code(analysis: &Analysis) -> i32 {
    if analysis
        .insights
        .iter()
        .any(|i| i.severity == Severity::Warning)
    {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perflens::PerfLens;

    #[test]
    fn quiet_mode_prints_bottleneck_labels_only() {
        let analysis = PerfLens::new()
            .analyze_str("35,116,397,372 cycles\n6,141,273,975 instructions\n")
            .unwrap();
        let out = format_analysis(&analysis, &OutputFormat::Quiet, true, &Theme::default());
        assert_eq!(out, "Low IPC");
        assert_eq!(exit_code(&analysis), 1);
    }

    #[test]
    fn clean_profile_exits_zero() {
        let analysis = PerfLens::new()
            .analyze_str("1,000 cycles\n3,000 instructions\n")
            .unwrap();
        assert_eq!(exit_code(&analysis), 0);
    }

    #[test]
    fn json_mode_emits_parseable_output() {
        let analysis = PerfLens::new()
            .analyze_str("2,000 cycles\n1,000 instructions\n")
            .unwrap();
        let out = format_analysis(&analysis, &OutputFormat::Json, true, &Theme::default());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["derived"]["ipc"], 0.5);
        assert!(value.get("insights").is_some());
    }
}
