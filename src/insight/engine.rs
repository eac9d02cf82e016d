//! Rule evaluation
//!
//! Walks the rule table left-to-right, collecting insights and filling
//! the bottleneck summary from the first claims encountered. A rule
//! that cannot compute its inputs contributes nothing; a failure in
//! one rule never aborts the rest of the pass.

use super::rules::{Rule, RuleContext};
use super::types::{BottleneckSummary, Insight};

/// Evaluate the rule table over one analysis context.
///
/// Returns the insights in evaluation order (not sorted by severity)
/// and the bottleneck summary. The first two ordinary claims become
/// primary and secondary; claims marked `primary_only_if_unset` fill
/// the primary slot only when it is still empty and never the
/// secondary slot.
pub fn evaluate(rules: &[Rule], ctx: &RuleContext<'_>) -> (Vec<Insight>, BottleneckSummary) {
    let mut insights = Vec::new();
    let mut summary = BottleneckSummary::default();

    for rule in rules {
        if !rule.enabled {
            continue;
        }
        let outcome = match (rule.eval)(ctx) {
            Some(outcome) => outcome,
            None => {
                log::trace!("rule {} did not fire", rule.name);
                continue;
            }
        };
        if let Some(insight) = outcome.insight {
            insights.push(insight);
        }
        if let Some(claim) = outcome.claim {
            if claim.primary_only_if_unset {
                if summary.primary.is_none() {
                    summary.primary = Some(claim.label);
                }
            } else if summary.primary.is_none() {
                summary.primary = Some(claim.label);
            } else if summary.secondary.is_none() {
                summary.secondary = Some(claim.label);
            }
        }
    }

    (insights, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisThresholds, CacheTopology, DerivedMetrics};
    use crate::insight::rules::ruleset;
    use crate::insight::types::Severity;
    use crate::record::{parse, Snapshot};

    fn run(record: &str) -> (Vec<Insight>, BottleneckSummary, Snapshot) {
        let snapshot = parse(record.lines()).expect("test record parses");
        let topology = CacheTopology {
            l2_kb: 1024,
            l3_kb: 32_768,
            line_bytes: 64,
        };
        let thresholds = AnalysisThresholds::default();
        let derived = DerivedMetrics::compute(&snapshot, &topology, &thresholds);
        let ctx = RuleContext {
            snapshot: &snapshot,
            derived: &derived,
            topology: &topology,
            thresholds: &thresholds,
        };
        let (insights, summary) = evaluate(&ruleset(), &ctx);
        (insights, summary, snapshot)
    }

    #[test]
    fn high_l2_miss_rate_becomes_a_bottleneck() {
        // L2 hit rate 37.52%: well inside the poor band.
        let (insights, summary, _) = run(
            "1,280,709,046 l2_rqsts.references\n\
             800,164,862 l2_rqsts.miss\n",
        );
        assert!(insights
            .iter()
            .any(|i| i.severity == Severity::Warning && i.message.contains("L2 requests miss")));
        let labels: Vec<&str> = summary
            .primary
            .iter()
            .chain(summary.secondary.iter())
            .map(String::as_str)
            .collect();
        assert!(labels.contains(&"L2 cache misses"));
    }

    #[test]
    fn tiling_advice_uses_detected_l2_size() {
        let (insights, _, _) = run(
            "1,000,000 l2_rqsts.references\n\
             800,000 l2_rqsts.miss\n",
        );
        let l2 = insights
            .iter()
            .find(|i| i.message.contains("L2 requests miss"))
            .unwrap();
        let detail = l2.detail.as_ref().unwrap();
        assert_eq!(detail["l2_kb"], 1024);
        // sqrt(1024*1024 / 24) = 209.x
        assert_eq!(detail["recommended_tile"], 209);
    }

    #[test]
    fn prefetch_band_is_informational_not_a_warning() {
        let (insights, summary, _) = run(
            "920,707,358 L1-dcache-loads\n\
             976,632,847 L1-dcache-load-misses\n",
        );
        let prefetch = insights
            .iter()
            .find(|i| i.message.contains("prefetchers"))
            .unwrap();
        assert_eq!(prefetch.severity, Severity::Info);
        // No warning fired, so no bottleneck either.
        assert!(summary.is_clean());
    }

    #[test]
    fn first_two_warnings_fill_primary_and_secondary_in_rule_order() {
        // Stall rule (order 1) and L1 rule (order 2) both fire; the
        // IPC warning (order 3) must not displace either.
        let (_, summary, _) = run(
            "10,000,000,000 cycles\n\
             1,000,000,000 instructions\n\
             8,000,000,000 cycle_activity.stalls_total\n\
             1,000,000,000 L1-dcache-loads\n\
             700,000,000 L1-dcache-load-misses\n",
        );
        assert_eq!(summary.primary.as_deref(), Some("CPU stalls"));
        assert_eq!(summary.secondary.as_deref(), Some("L1 data cache misses"));
    }

    #[test]
    fn memory_bound_oi_claims_primary_only_when_unset() {
        // Low OI alone, with no warnings: becomes primary. FP volume
        // stays under the vectorization noise floor so no other rule
        // fires.
        let (_, summary, _) = run(
            "50,000 fp_arith_inst_retired.scalar_single\n\
             1,000,000 LLC-load-misses\n",
        );
        // OI = 5e4 / (1e6 * 64) << 5
        assert_eq!(
            summary.primary.as_deref(),
            Some("Memory-bound (low operational intensity)")
        );
        assert!(summary.secondary.is_none());
    }

    #[test]
    fn missing_counters_skip_rules_without_failing() {
        let (insights, summary, snapshot) = run("42 instructions\n");
        assert_eq!(snapshot.count("cycles"), None);
        assert!(insights.is_empty());
        assert!(summary.is_clean());
    }

    #[test]
    fn disabled_rule_is_skipped() {
        let snapshot = parse("10,000,000,000 cycles\n8,000,000,000 cycle_activity.stalls_total\n".lines())
            .unwrap();
        let topology = CacheTopology::default();
        let thresholds = AnalysisThresholds::default();
        let derived = DerivedMetrics::compute(&snapshot, &topology, &thresholds);
        let ctx = RuleContext {
            snapshot: &snapshot,
            derived: &derived,
            topology: &topology,
            thresholds: &thresholds,
        };
        let mut rules = ruleset();
        rules[0].enabled = false;
        let (insights, summary) = evaluate(&rules, &ctx);
        assert!(insights.iter().all(|i| !i.message.contains("stalled")));
        assert!(summary.is_clean());
    }

    #[test]
    fn insights_follow_evaluation_order_not_severity() {
        let (insights, _, _) = run(
            "10,000,000,000 cycles\n\
             30,000,000,000 instructions\n\
             1,000,000,000 branches\n\
             1,000,000 branch-misses\n",
        );
        // Good IPC note (rule 3) must precede the excellent-branch
        // note (rule 6) regardless of both being positive.
        let ipc_pos = insights
            .iter()
            .position(|i| i.message.contains("Good IPC"))
            .unwrap();
        let branch_pos = insights
            .iter()
            .position(|i| i.message.contains("Branch prediction"))
            .unwrap();
        assert!(ipc_pos < branch_pos);
    }
}
