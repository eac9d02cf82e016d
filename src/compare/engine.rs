//! Comparison engine

use super::types::{ChangeBand, ComparisonResult, EventDelta, SpeedChange};
use crate::analysis::{AnalysisThresholds, CacheTopology, CompareThresholds, DerivedMetrics};
use crate::counters::catalog::keys;
use crate::record::Snapshot;

/// Compare a candidate run against a baseline run.
///
/// Derived-metric deltas are recomputed independently for each side
/// from raw counts, never interpolated from the per-event deltas.
pub fn compare(
    baseline: &Snapshot,
    candidate: &Snapshot,
    topology: &CacheTopology,
    thresholds: &AnalysisThresholds,
    bands: &CompareThresholds,
) -> ComparisonResult {
    let baseline_derived = DerivedMetrics::compute(baseline, topology, thresholds);
    let candidate_derived = DerivedMetrics::compute(candidate, topology, thresholds);

    let mut union = baseline.event_keys();
    union.extend(candidate.event_keys());

    let events = union
        .into_iter()
        .map(|key| {
            let base = baseline.count(key);
            let cand = candidate.count(key);
            // Undefined change (no or zero baseline) reports as 0%,
            // a documented simplification rather than an infinity.
            let pct = pct_change(
                base.unwrap_or(0) as f64,
                cand.unwrap_or(0) as f64,
            );
            EventDelta {
                event: key.to_string(),
                baseline: base,
                candidate: cand,
                pct_change: pct,
                band: classify_change(pct, bands.neutral_band_pct),
            }
        })
        .collect();

    let (elapsed_delta_seconds, speed) =
        match (baseline.elapsed_seconds(), candidate.elapsed_seconds()) {
            (Some(base), Some(cand)) => {
                let speed = if base > cand {
                    Some(SpeedChange::Speedup(base / cand))
                } else if cand > base {
                    Some(SpeedChange::Slowdown(cand / base))
                } else {
                    None
                };
                (Some(cand - base), speed)
            }
            _ => (None, None),
        };

    let explanations = explain(
        baseline,
        candidate,
        &baseline_derived,
        &candidate_derived,
        bands,
    );

    ComparisonResult {
        events,
        baseline_derived,
        candidate_derived,
        elapsed_delta_seconds,
        speed,
        explanations,
    }
}

/// Percent change from baseline to current; 0 when the baseline is
/// zero.
fn pct_change(baseline: f64, current: f64) -> f64 {
    if baseline > 0.0 {
        (current - baseline) / baseline * 100.0
    } else {
        0.0
    }
}

fn classify_change(pct: f64, neutral_band: f64) -> ChangeBand {
    if pct < -neutral_band {
        ChangeBand::Improvement
    } else if pct > neutral_band {
        ChangeBand::Regression
    } else {
        ChangeBand::Neutral
    }
}

/// The fixed set of opportunistic explanation checks. Each check only
/// runs when both sides carry the counters it needs.
fn explain(
    baseline: &Snapshot,
    candidate: &Snapshot,
    baseline_derived: &DerivedMetrics,
    candidate_derived: &DerivedMetrics,
    bands: &CompareThresholds,
) -> Vec<String> {
    let mut findings = Vec::new();

    if let Some(pct) = event_pct_change(baseline, candidate, keys::L2_REFERENCES) {
        if pct < -bands.l2_traffic_pct {
            findings.push(format!("L2 traffic reduced by {:.1}%", -pct));
        } else if pct > bands.l2_traffic_pct {
            findings.push(format!("L2 traffic increased by {:.1}%", pct));
        }
    }

    if let Some(pct) = event_pct_change(baseline, candidate, keys::STALLS_L2_MISS) {
        if pct < -bands.l2_stall_reduction_pct {
            findings.push(format!("Cycles stalled on L2 misses fell by {:.1}%", -pct));
        }
    }

    if let Some(pct) = event_pct_change(baseline, candidate, keys::LLC_LOADS) {
        if pct < -bands.l3_traffic_reduction_pct {
            findings.push(format!("L3 traffic reduced by {:.1}%", -pct));
        }
    }

    if let Some(pct) = event_pct_change(baseline, candidate, keys::LLC_STORES) {
        if pct < -bands.store_traffic_reduction_pct {
            findings.push(format!("Store traffic reduced by {:.1}%", -pct));
        }
    }

    if let (Some(base_oi), Some(cand_oi)) = (
        baseline_derived.operational_intensity,
        candidate_derived.operational_intensity,
    ) {
        if base_oi > 0.0 {
            let ratio = cand_oi / base_oi;
            if ratio >= bands.oi_gain_ratio {
                findings.push(format!(
                    "Operational intensity improved {:.2}x ({:.2} to {:.2} FLOPs/byte)",
                    ratio, base_oi, cand_oi
                ));
            } else if ratio <= bands.oi_loss_ratio {
                findings.push(format!(
                    "Operational intensity fell to {:.2}x ({:.2} to {:.2} FLOPs/byte)",
                    ratio, base_oi, cand_oi
                ));
            }
        }
    }

    if let (Some(base_ratio), Some(cand_ratio)) = (
        baseline_derived.l1_miss_ratio_pct,
        candidate_derived.l1_miss_ratio_pct,
    ) {
        if cand_ratio > 0.0 && base_ratio / cand_ratio >= bands.prefetch_reduction_ratio {
            findings.push(format!(
                "L1 miss/prefetch ratio dropped from {:.1}% to {:.1}%",
                base_ratio, cand_ratio
            ));
        }
    }

    if let (Some(base_stalls), Some(cand_stalls), Some(base_cycles)) = (
        baseline.count(keys::STALLS_TOTAL),
        candidate.count(keys::STALLS_TOTAL),
        baseline.count(keys::CYCLES),
    ) {
        if base_cycles > 0 && base_stalls > cand_stalls {
            let saved = base_stalls - cand_stalls;
            let saved_pct = saved as f64 / base_cycles as f64 * 100.0;
            if saved_pct > bands.stall_savings_pct {
                findings.push(format!(
                    "{} stall cycles saved ({:.1}% of baseline cycles)",
                    saved, saved_pct
                ));
            }
        }
    }

    if findings.is_empty() {
        findings.push(
            "No significant difference between runs; possibly measurement noise".to_string(),
        );
    }
    findings
}

/// Percent change of one event when the baseline has a positive count.
fn event_pct_change(baseline: &Snapshot, candidate: &Snapshot, key: &str) -> Option<f64> {
    let base = baseline.count(key)?;
    let cand = candidate.count(key)?;
    if base == 0 {
        return None;
    }
    Some(pct_change(base as f64, cand as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse;

    fn snap(record: &str) -> Snapshot {
        parse(record.lines()).expect("test record parses")
    }

    fn run(baseline: &Snapshot, candidate: &Snapshot) -> ComparisonResult {
        compare(
            baseline,
            candidate,
            &CacheTopology::default(),
            &AnalysisThresholds::default(),
            &CompareThresholds::default(),
        )
    }

    fn delta<'a>(result: &'a ComparisonResult, key: &str) -> &'a EventDelta {
        result
            .events
            .iter()
            .find(|d| d.event == key)
            .expect("event row present")
    }

    #[test]
    fn time_not_cycles_governs_speedup_direction() {
        // Fewer cycles but more wall time: that is a slowdown.
        let baseline = snap(
            "35,840,708,047 cycles\n\
             0.391000000 seconds time elapsed\n",
        );
        let candidate = snap(
            "35,618,884,300 cycles\n\
             0.400000000 seconds time elapsed\n",
        );
        let result = run(&baseline, &candidate);
        match result.speed {
            Some(SpeedChange::Slowdown(factor)) => {
                assert!((factor - 0.400 / 0.391).abs() < 1e-9);
                assert!(factor > 1.02 && factor < 1.03);
            }
            other => panic!("expected slowdown, got {:?}", other),
        }
        let elapsed = result.elapsed_delta_seconds.unwrap();
        assert!((elapsed - 0.009).abs() < 1e-9);
    }

    #[test]
    fn equal_or_unknown_elapsed_reports_no_speed_change() {
        let a = snap("1 cycles\n0.500000000 seconds time elapsed\n");
        let b = snap("2 cycles\n0.500000000 seconds time elapsed\n");
        assert!(run(&a, &b).speed.is_none());

        let no_time = snap("1 cycles\n");
        assert!(run(&a, &no_time).speed.is_none());
        assert!(run(&a, &no_time).elapsed_delta_seconds.is_none());
    }

    #[test]
    fn sentinel_baseline_reports_zero_change_not_a_fault() {
        let baseline = snap(
            "1,000 cycles\n\
             <not counted> l2_rqsts.references\n",
        );
        let candidate = snap(
            "1,000 cycles\n\
             500,000 l2_rqsts.references\n",
        );
        let result = run(&baseline, &candidate);
        let row = delta(&result, "l2_rqsts.references");
        assert_eq!(row.baseline, None);
        assert_eq!(row.candidate, Some(500_000));
        assert_eq!(row.pct_change, 0.0);
        assert_eq!(row.band, ChangeBand::Neutral);
    }

    #[test]
    fn zero_baseline_reports_zero_change() {
        let baseline = snap("0 branch-misses\n1 cycles\n");
        let candidate = snap("9,999 branch-misses\n1 cycles\n");
        let result = run(&baseline, &candidate);
        assert_eq!(delta(&result, "branch-misses").pct_change, 0.0);
    }

    #[test]
    fn change_bands_split_at_five_percent() {
        let baseline = snap(
            "1,000 instructions\n\
             1,000 branches\n\
             1,000 cycles\n",
        );
        let candidate = snap(
            "1,040 instructions\n\
             1,200 branches\n\
             900 cycles\n",
        );
        let result = run(&baseline, &candidate);
        assert_eq!(delta(&result, "instructions").band, ChangeBand::Neutral);
        assert_eq!(delta(&result, "branches").band, ChangeBand::Regression);
        assert_eq!(delta(&result, "cycles").band, ChangeBand::Improvement);
    }

    #[test]
    fn simple_ratio_deltas_are_direction_antisymmetric() {
        let a = snap("1,000 cycles\n2,000 instructions\n");
        let b = snap("1,000 cycles\n3,000 instructions\n");
        let forward = run(&a, &b);
        let backward = run(&b, &a);
        let f = delta(&forward, "instructions").pct_change;
        let r = delta(&backward, "instructions").pct_change;
        // +50% one way, -33.3% the other: sign flips, magnitude does not.
        assert!(f > 0.0 && r < 0.0);
        assert!((f - 50.0).abs() < 1e-9);
        assert!((r + 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn derived_deltas_are_recomputed_per_side() {
        let baseline = snap("10,000 cycles\n5,000 instructions\n");
        let candidate = snap("10,000 cycles\n20,000 instructions\n");
        let result = run(&baseline, &candidate);
        assert!((result.baseline_derived.ipc.unwrap() - 0.5).abs() < 1e-12);
        assert!((result.candidate_derived.ipc.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn l2_traffic_reduction_is_explained() {
        let baseline = snap("1,000,000 l2_rqsts.references\n1 cycles\n");
        let candidate = snap("600,000 l2_rqsts.references\n1 cycles\n");
        let result = run(&baseline, &candidate);
        assert!(result
            .explanations
            .iter()
            .any(|e| e.contains("L2 traffic reduced by 40.0%")));
    }

    #[test]
    fn stall_savings_are_explained() {
        let baseline = snap(
            "10,000,000 cycles\n\
             5,000,000 cycle_activity.stalls_total\n",
        );
        let candidate = snap(
            "9,000,000 cycles\n\
             4,000,000 cycle_activity.stalls_total\n",
        );
        let result = run(&baseline, &candidate);
        // 1M cycles saved = 10% of baseline cycles
        assert!(result
            .explanations
            .iter()
            .any(|e| e.contains("stall cycles saved")));
    }

    #[test]
    fn quiet_comparison_falls_back_to_noise_message() {
        let a = snap("1,000 cycles\n1,000 instructions\n");
        let b = snap("1,001 cycles\n1,002 instructions\n");
        let result = run(&a, &b);
        assert_eq!(result.explanations.len(), 1);
        assert!(result.explanations[0].contains("measurement noise"));
    }
}
