//! Report rendering
//!
//! Pure rendering over the analysis/comparison value objects. All
//! presentation state lives in the [`Theme`] argument; the analysis
//! pipeline knows nothing about colors or layout, and any renderer can
//! be substituted by consuming the underlying structured values
//! directly.

use std::fmt::Write as _;

use serde_json::json;

use crate::analysis::DerivedMetrics;
use crate::compare::{ChangeBand, ComparisonResult, SpeedChange};
use crate::counters::catalog::{self, EventCategory};
use crate::insight::{BottleneckSummary, Insight, Severity};
use crate::record::Snapshot;

/// Presentation parameters. A value, not process-global state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Theme {
    /// Emit ANSI color codes
    pub color: bool,
}

impl Theme {
    fn severity_marker(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Ok => "+",
            Severity::Info => "*",
            Severity::Warning => "!",
        }
    }

    fn paint(&self, text: &str, severity: Severity) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Ok => "32",
            Severity::Info => "36",
            Severity::Warning => "33",
        };
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Render a full analysis report: counter table, derived metrics,
/// insights, and the bottleneck summary. `insights` may be `None` to
/// suppress the insight and summary blocks.
pub fn render_analysis(
    snapshot: &Snapshot,
    derived: &DerivedMetrics,
    insights: Option<(&[Insight], &BottleneckSummary)>,
    theme: &Theme,
) -> String {
    let mut out = String::new();
    out.push_str("Performance Counter Report\n");
    out.push_str("==========================\n");

    for category in EventCategory::display_order() {
        let rows = category_rows(snapshot, *category);
        if rows.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", category.heading());
        for (label, value, rate) in rows {
            match rate {
                Some(rate) => {
                    let _ = writeln!(out, "  {:<34} {:>20}   # {}", label, value, rate);
                }
                None => {
                    let _ = writeln!(out, "  {:<34} {:>20}", label, value);
                }
            }
        }
    }

    if let Some(elapsed) = snapshot.elapsed_seconds() {
        let _ = writeln!(out, "\nElapsed time: {:.6} s", elapsed);
    }

    out.push_str("\nDerived Metrics\n");
    out.push_str("---------------\n");
    for line in derived_lines(derived) {
        let _ = writeln!(out, "  {}", line);
    }

    if let Some((insights, summary)) = insights {
        out.push_str("\nInsights\n");
        out.push_str("--------\n");
        if insights.is_empty() {
            out.push_str("  (no findings; counters too sparse)\n");
        }
        for insight in insights {
            let line = format!("{} {}", theme.severity_marker(insight.severity), insight.message);
            let _ = writeln!(out, "  {}", theme.paint(&line, insight.severity));
        }

        out.push_str("\nBottleneck Summary\n");
        out.push_str("------------------\n");
        match &summary.primary {
            Some(primary) => {
                let _ = writeln!(out, "  primary:   {}", primary);
            }
            None => out.push_str("  primary:   none detected\n"),
        }
        if let Some(secondary) = &summary.secondary {
            let _ = writeln!(out, "  secondary: {}", secondary);
        }
    }

    out
}

/// Render a comparison report: per-event table, derived-metric deltas,
/// speed factor, and explanations.
pub fn render_comparison(result: &ComparisonResult, theme: &Theme) -> String {
    let mut out = String::new();
    out.push_str("Comparison Report (baseline vs candidate)\n");
    out.push_str("=========================================\n\n");

    let _ = writeln!(
        out,
        "  {:<40} {:>18} {:>18} {:>9}",
        "event", "baseline", "candidate", "change"
    );
    for row in &result.events {
        let marker = match row.band {
            ChangeBand::Improvement => "-",
            ChangeBand::Regression => "+",
            ChangeBand::Neutral => " ",
        };
        let _ = writeln!(
            out,
            "  {:<40} {:>18} {:>18} {:>7.1}% {}",
            row.event,
            format_optional_count(row.baseline),
            format_optional_count(row.candidate),
            row.pct_change,
            marker
        );
    }

    out.push_str("\nDerived Metric Deltas\n");
    out.push_str("---------------------\n");
    for line in delta_lines(&result.baseline_derived, &result.candidate_derived) {
        let _ = writeln!(out, "  {}", line);
    }
    if let Some(delta) = result.elapsed_delta_seconds {
        let _ = writeln!(out, "  elapsed time:        {:+.3} s", delta);
    }
    match result.speed {
        Some(SpeedChange::Speedup(factor)) => {
            let line = format!("speedup:             {:.2}x faster", factor);
            let _ = writeln!(out, "  {}", theme.paint(&line, Severity::Ok));
        }
        Some(SpeedChange::Slowdown(factor)) => {
            let line = format!("slowdown:            {:.2}x slower", factor);
            let _ = writeln!(out, "  {}", theme.paint(&line, Severity::Warning));
        }
        None => {}
    }

    out.push_str("\nExplanation\n");
    out.push_str("-----------\n");
    for finding in &result.explanations {
        let _ = writeln!(out, "  * {}", finding);
    }

    out
}

/// Structured JSON form of an analysis, for machine consumers.
pub fn analysis_json(
    snapshot: &Snapshot,
    derived: &DerivedMetrics,
    insights: Option<(&[Insight], &BottleneckSummary)>,
) -> serde_json::Value {
    let events: serde_json::Map<String, serde_json::Value> = snapshot
        .events()
        .map(|(key, count)| (key.to_string(), json!(count)))
        .collect();
    let mut value = json!({
        "events": events,
        "elapsed_seconds": snapshot.elapsed_seconds(),
        "derived": derived,
    });
    if let Some((insights, summary)) = insights {
        value["insights"] = json!(insights);
        value["bottlenecks"] = json!(summary);
    }
    value
}

/// Structured JSON form of a comparison.
pub fn comparison_json(result: &ComparisonResult) -> serde_json::Value {
    json!(result)
}

/// Rows for one category: (label, formatted count, rate annotation).
///
/// Cataloged events render in catalog order; unknown keys all land in
/// `Other` and follow in key order.
fn category_rows(
    snapshot: &Snapshot,
    category: EventCategory,
) -> Vec<(String, String, Option<String>)> {
    let mut rows = Vec::new();
    let mut push_key = |key: &str, label: &str| {
        let value = match snapshot.count(key) {
            Some(count) => group_digits(count),
            None => "<not counted>".to_string(),
        };
        rows.push((
            label.to_string(),
            value,
            snapshot.rate(key).map(str::to_string),
        ));
    };
    let present = snapshot.event_keys();
    for key in catalog::known_keys() {
        if !present.contains(key) {
            continue;
        }
        let (event_category, label) = catalog::classify(key);
        if event_category == category {
            push_key(key, label);
        }
    }
    if category == EventCategory::Other {
        for key in present {
            let (event_category, label) = catalog::classify(key);
            if event_category == EventCategory::Other {
                push_key(key, label);
            }
        }
    }
    rows
}

fn format_optional_count(count: Option<u64>) -> String {
    match count {
        Some(count) => group_digits(count),
        None => "-".to_string(),
    }
}

/// Thousands-grouped rendering of a count.
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// One display line per computable derived metric.
fn derived_lines(derived: &DerivedMetrics) -> Vec<String> {
    let mut lines = Vec::new();
    let mut push = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            lines.push(format!("{:<26} {}", label, value));
        }
    };
    push("IPC:", derived.ipc.map(|v| format!("{:.3}", v)));
    push("CPI:", derived.cpi.map(|v| format!("{:.3}", v)));
    push(
        "L1 miss/load ratio:",
        derived.l1_miss_ratio_pct.map(|v| format!("{:.2}%", v)),
    );
    push(
        "L2 hit rate:",
        derived.l2_hit_rate_pct.map(|v| format!("{:.2}%", v)),
    );
    push(
        "L3 hit rate:",
        derived.l3_hit_rate_pct.map(|v| format!("{:.2}%", v)),
    );
    push(
        "Cache hit rate:",
        derived.cache_hit_rate_pct.map(|v| format!("{:.2}%", v)),
    );
    push(
        "Branch miss rate:",
        derived.branch_miss_rate_pct.map(|v| format!("{:.2}%", v)),
    );
    push(
        "Stalled cycles:",
        derived.stall_pct.map(|v| format!("{:.1}%", v)),
    );
    push(
        "Memory stall cycles:",
        derived.memory_stall_pct.map(|v| format!("{:.1}%", v)),
    );
    push(
        "Memory intensity:",
        derived
            .memory_intensity
            .map(|v| format!("{:.3} loads/insn", v)),
    );
    push(
        "Total FLOPs:",
        derived.total_flops.map(|v| format!("{:.3e}", v)),
    );
    push("GFLOPS:", derived.gflops.map(|v| format!("{:.2}", v)));
    push(
        "Vectorization ratio:",
        derived
            .vectorization_ratio_pct
            .map(|v| format!("{:.1}%", v)),
    );
    push(
        "Operational intensity:",
        derived
            .operational_intensity
            .map(|v| format!("{:.2} FLOPs/byte", v)),
    );
    push(
        "Est. read bandwidth:",
        derived
            .read_bandwidth_gbs
            .map(|v| format!("{:.2} GB/s", v)),
    );
    if let Some(breakdown) = &derived.stall_breakdown {
        lines.push(format!(
            "{:<26} L2 {:.1}%, L3 {:.1}%, DRAM {:.1}% of L1-miss stalls",
            "Memory latency split:",
            breakdown.l2_hit_pct(),
            breakdown.l3_hit_pct(),
            breakdown.dram_pct()
        ));
    }
    if lines.is_empty() {
        lines.push("(no derived metrics computable from this record)".to_string());
    }
    lines
}

/// Before/after lines for the comparison's derived block.
fn delta_lines(baseline: &DerivedMetrics, candidate: &DerivedMetrics) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pair = |label: &str, base: Option<f64>, cand: Option<f64>, unit: &str, pp: bool| {
        if let (Some(base), Some(cand)) = (base, cand) {
            let delta = cand - base;
            let suffix = if pp { "pp" } else { unit };
            lines.push(format!(
                "{:<20} {:.3}{} -> {:.3}{} ({:+.3} {})",
                label, base, unit, cand, unit, delta, suffix
            ));
        }
    };
    pair("IPC:", baseline.ipc, candidate.ipc, "", false);
    pair(
        "L1 miss ratio:",
        baseline.l1_miss_ratio_pct,
        candidate.l1_miss_ratio_pct,
        "%",
        true,
    );
    pair(
        "L2 hit rate:",
        baseline.l2_hit_rate_pct,
        candidate.l2_hit_rate_pct,
        "%",
        true,
    );
    pair(
        "L3 hit rate:",
        baseline.l3_hit_rate_pct,
        candidate.l3_hit_rate_pct,
        "%",
        true,
    );
    pair(
        "Branch miss rate:",
        baseline.branch_miss_rate_pct,
        candidate.branch_miss_rate_pct,
        "%",
        true,
    );
    pair(
        "Stalled cycles:",
        baseline.stall_pct,
        candidate.stall_pct,
        "%",
        true,
    );
    pair("GFLOPS:", baseline.gflops, candidate.gflops, "", false);
    pair(
        "Op. intensity:",
        baseline.operational_intensity,
        candidate.operational_intensity,
        "",
        false,
    );
    pair(
        "Read bandwidth:",
        baseline.read_bandwidth_gbs,
        candidate.read_bandwidth_gbs,
        " GB/s",
        false,
    );
    if lines.is_empty() {
        lines.push("(no derived metrics computable on both sides)".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisThresholds, CacheTopology};
    use crate::compare;
    use crate::record::parse;

    #[test]
    fn digits_group_in_threes() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(35_116_397_372), "35,116,397,372");
    }

    #[test]
    fn report_shows_unavailable_counters_and_rates() {
        let snapshot = parse(
            "1,000 cycles # 3.2 GHz\n\
             <not counted> l2_rqsts.miss\n"
                .lines(),
        )
        .unwrap();
        let derived = DerivedMetrics::compute(
            &snapshot,
            &CacheTopology::default(),
            &AnalysisThresholds::default(),
        );
        let text = render_analysis(&snapshot, &derived, None, &Theme::default());
        assert!(text.contains("CPU Cycles"));
        assert!(text.contains("# 3.2 GHz"));
        assert!(text.contains("<not counted>"));
        // Insight blocks suppressed when not requested.
        assert!(!text.contains("Bottleneck Summary"));
    }

    #[test]
    fn comparison_report_carries_speed_and_explanations() {
        let baseline = parse(
            "1,000,000 l2_rqsts.references\n0.500000000 seconds time elapsed\n".lines(),
        )
        .unwrap();
        let candidate = parse(
            "600,000 l2_rqsts.references\n0.250000000 seconds time elapsed\n".lines(),
        )
        .unwrap();
        let result = compare::compare(
            &baseline,
            &candidate,
            &CacheTopology::default(),
            &AnalysisThresholds::default(),
            &crate::analysis::CompareThresholds::default(),
        );
        let text = render_comparison(&result, &Theme::default());
        assert!(text.contains("2.00x faster"));
        assert!(text.contains("L2 traffic reduced by 40.0%"));
        assert!(text.contains("l2_rqsts.references"));
    }

    #[test]
    fn json_report_exposes_structured_values() {
        let snapshot = parse("2,000 cycles\n1,000 instructions\n".lines()).unwrap();
        let derived = DerivedMetrics::compute(
            &snapshot,
            &CacheTopology::default(),
            &AnalysisThresholds::default(),
        );
        let value = analysis_json(&snapshot, &derived, None);
        assert_eq!(value["events"]["cycles"], 2_000);
        assert_eq!(value["derived"]["ipc"], 0.5);
    }
}
