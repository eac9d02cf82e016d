//! Declarative threshold tables
//!
//! All rule bands and comparator bands live here as plain data with
//! serde support, so they can be recalibrated for another
//! microarchitecture from the config file without touching any control
//! flow. Defaults are the values the rules were calibrated with.

use serde::{Deserialize, Serialize};

/// Thresholds consumed by the derived-metric calculator and the
/// insight rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisThresholds {
    /// Total stall cycles as % of cycles above which the run is
    /// considered stall-bound
    pub stall_warn_pct: f64,
    /// L1 miss/load % above which demand misses are a concern
    /// (the >100% band is prefetch activity, not a defect)
    pub l1_miss_warn_pct: f64,
    /// IPC below this warns
    pub ipc_warn: f64,
    /// IPC at or above this gets a positive note
    pub ipc_good: f64,
    /// L2 miss % above which tiling advice is emitted
    pub l2_miss_warn_pct: f64,
    /// L2 miss % below which a positive note is emitted
    pub l2_miss_good_pct: f64,
    /// L3 hit % below which memory-bandwidth risk warns
    pub l3_hit_warn_pct: f64,
    /// L3 hit % above which a positive note is emitted
    pub l3_hit_excellent_pct: f64,
    /// Branch miss % below this is excellent
    pub branch_excellent_pct: f64,
    /// Branch miss % above this warns
    pub branch_warn_pct: f64,
    /// dTLB misses per L1 load, in %, above which TLB pressure warns
    pub tlb_warn_pct: f64,
    /// Vectorization ratio below this warns
    pub vectorization_low_pct: f64,
    /// Vectorization ratio above this gets a positive note
    pub vectorization_high_pct: f64,
    /// Minimum total FP instructions before vectorization rules fire
    /// (suppresses spurious 0%/100% on non-numeric workloads)
    pub fp_noise_floor: u64,
    /// Instruction-cache misses per kilo-instruction above which
    /// frontend pressure warns
    pub icache_mpki_warn: f64,
    /// LLC store-miss % above which write-allocate traffic warns
    pub store_miss_warn_pct: f64,
    /// Minimum LLC stores before the store-bound rule fires
    pub store_traffic_floor: u64,
    /// Peak sustainable read bandwidth of the machine, GB/s
    pub peak_bandwidth_gbs: f64,
    /// Fraction of peak bandwidth above which saturation warns
    pub bandwidth_util_warn: f64,
    /// Fixed cycle penalty charged per branch miss for the cost estimate
    pub branch_penalty_cycles: u64,
    /// Estimated branch-miss cycle cost as % of cycles above which it warns
    pub branch_cost_warn_pct: f64,
    /// Stall cycles not explained by L1-miss stalls, as % of cycles,
    /// above which core-bound stalls warn
    pub residual_stall_warn_pct: f64,
    /// % of L1-miss stalls one tier must account for before the
    /// memory-latency breakdown is reported
    pub tier_dominant_pct: f64,
    /// Operational intensity below this is memory-bound
    pub oi_memory_bound: f64,
    /// Operational intensity above this is compute-bound
    pub oi_compute_bound: f64,
    /// 512-bit share of 256/512-bit packed instructions below which
    /// vector-width utilization warns
    pub wide_vector_low_pct: f64,
    /// Minimum combined 256/512-bit packed instructions before the
    /// vector-width rule fires
    pub wide_vector_floor: u64,
    /// Minimum total FP instructions for the workload heuristic
    pub heuristic_fp_floor: u64,
    /// L3 miss % trigger for the workload heuristic
    pub heuristic_l3_miss_pct: f64,
    /// Operational-intensity trigger for the workload heuristic
    pub heuristic_oi: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            stall_warn_pct: 50.0,
            l1_miss_warn_pct: 50.0,
            ipc_warn: 0.5,
            ipc_good: 1.0,
            l2_miss_warn_pct: 50.0,
            l2_miss_good_pct: 20.0,
            l3_hit_warn_pct: 80.0,
            l3_hit_excellent_pct: 95.0,
            branch_excellent_pct: 1.0,
            branch_warn_pct: 5.0,
            tlb_warn_pct: 1.0,
            vectorization_low_pct: 10.0,
            vectorization_high_pct: 80.0,
            fp_noise_floor: 100_000,
            icache_mpki_warn: 20.0,
            store_miss_warn_pct: 50.0,
            store_traffic_floor: 1_000_000,
            peak_bandwidth_gbs: 50.0,
            bandwidth_util_warn: 0.70,
            branch_penalty_cycles: 20,
            branch_cost_warn_pct: 5.0,
            residual_stall_warn_pct: 30.0,
            tier_dominant_pct: 50.0,
            oi_memory_bound: 5.0,
            oi_compute_bound: 15.0,
            wide_vector_low_pct: 50.0,
            wide_vector_floor: 1_000_000,
            heuristic_fp_floor: 1_000_000,
            heuristic_l3_miss_pct: 15.0,
            heuristic_oi: 10.0,
        }
    }
}

/// Bands used by the comparator for display emphasis and for the
/// opportunistic explanation checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareThresholds {
    /// Per-event changes within +/- this many % render as neutral
    pub neutral_band_pct: f64,
    /// L2 traffic change beyond +/- this many % is worth explaining
    pub l2_traffic_pct: f64,
    /// L2-miss-stall reduction beyond this % is worth explaining
    pub l2_stall_reduction_pct: f64,
    /// L3 traffic reduction beyond this % is worth explaining
    pub l3_traffic_reduction_pct: f64,
    /// Store traffic reduction beyond this % is worth explaining
    pub store_traffic_reduction_pct: f64,
    /// Operational-intensity improvement ratio worth explaining
    pub oi_gain_ratio: f64,
    /// Operational-intensity degradation ratio worth explaining
    pub oi_loss_ratio: f64,
    /// Prefetch-ratio (L1 miss/load) reduction factor worth explaining
    pub prefetch_reduction_ratio: f64,
    /// Stall cycles saved, as % of baseline cycles, worth explaining
    pub stall_savings_pct: f64,
}

impl Default for CompareThresholds {
    fn default() -> Self {
        Self {
            neutral_band_pct: 5.0,
            l2_traffic_pct: 10.0,
            l2_stall_reduction_pct: 20.0,
            l3_traffic_reduction_pct: 20.0,
            store_traffic_reduction_pct: 20.0,
            oi_gain_ratio: 1.5,
            oi_loss_ratio: 0.67,
            prefetch_reduction_ratio: 1.3,
            stall_savings_pct: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibration() {
        let t = AnalysisThresholds::default();
        assert_eq!(t.stall_warn_pct, 50.0);
        assert_eq!(t.ipc_warn, 0.5);
        assert_eq!(t.oi_memory_bound, 5.0);
        assert_eq!(t.bandwidth_util_warn, 0.70);
    }

    #[test]
    fn thresholds_round_trip_through_toml() {
        let t = AnalysisThresholds::default();
        let text = toml::to_string(&t).unwrap();
        let back: AnalysisThresholds = toml::from_str(&text).unwrap();
        assert_eq!(back.l2_miss_warn_pct, t.l2_miss_warn_pct);
        assert_eq!(back.fp_noise_floor, t.fp_noise_floor);
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let t: AnalysisThresholds = toml::from_str("peak_bandwidth_gbs = 200.0").unwrap();
        assert_eq!(t.peak_bandwidth_gbs, 200.0);
        assert_eq!(t.stall_warn_pct, 50.0);
    }
}
