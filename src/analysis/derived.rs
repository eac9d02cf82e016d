//! Derived metrics computed from one snapshot
//!
//! Every field is optional: it is present only when the counters it
//! needs are present and its denominator is non-zero. Absent counters
//! propagate as "not computable" and the corresponding field is simply
//! omitted from reporting. Derived metrics are recomputed fresh on
//! each analysis call and never mutated in place.

use serde::Serialize;

use super::stalls::StallBreakdown;
use super::{AnalysisThresholds, CacheTopology};
use crate::counters::catalog::keys;
use crate::record::Snapshot;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// FLOP element weights per packed instruction:
/// (event key, elements per instruction).
static FLOP_WEIGHTS: &[(&str, u64)] = &[
    (keys::FP_SCALAR_SINGLE, 1),
    (keys::FP_SCALAR_DOUBLE, 1),
    (keys::FP_128_SINGLE, 4),
    (keys::FP_128_DOUBLE, 2),
    (keys::FP_256_SINGLE, 8),
    (keys::FP_256_DOUBLE, 4),
    (keys::FP_512_SINGLE, 16),
    (keys::FP_512_DOUBLE, 8),
];

/// Value object holding everything computable from one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedMetrics {
    /// Instructions per cycle
    pub ipc: Option<f64>,
    /// Cycles per instruction (1/IPC)
    pub cpi: Option<f64>,
    /// L1 load misses per L1 load, in percent. Values above 100% mean
    /// the prefetchers generate more misses than demand loads; that is
    /// reported as prefetch activity, not an error.
    pub l1_miss_ratio_pct: Option<f64>,
    /// L2 hit rate in percent
    pub l2_hit_rate_pct: Option<f64>,
    /// L3 hit rate in percent
    pub l3_hit_rate_pct: Option<f64>,
    /// Overall cache hit rate in percent
    pub cache_hit_rate_pct: Option<f64>,
    /// Branch misses per branch instruction, in percent
    pub branch_miss_rate_pct: Option<f64>,
    /// Total stall cycles as percent of cycles
    pub stall_pct: Option<f64>,
    /// Memory stall cycles as percent of cycles
    pub memory_stall_pct: Option<f64>,
    /// L1 loads per instruction
    pub memory_intensity: Option<f64>,
    /// Scalar FP instructions retired
    pub scalar_fp_instructions: Option<u64>,
    /// Packed FP instructions retired (all widths)
    pub packed_fp_instructions: Option<u64>,
    /// 256-bit packed FP instructions retired
    pub wide_256_instructions: Option<u64>,
    /// 512-bit packed FP instructions retired
    pub wide_512_instructions: Option<u64>,
    /// Total floating-point operations (element-weighted)
    pub total_flops: Option<f64>,
    /// FLOPs per second in units of 1e9, requires elapsed time
    pub gflops: Option<f64>,
    /// Packed share of FP instructions, in percent; suppressed below
    /// the FP noise floor
    pub vectorization_ratio_pct: Option<f64>,
    /// FLOPs per byte of DRAM traffic
    pub operational_intensity: Option<f64>,
    /// Estimated read bandwidth in binary GB/s
    pub read_bandwidth_gbs: Option<f64>,
    /// Nested stall decomposition by serving tier
    pub stall_breakdown: Option<StallBreakdown>,
}

impl DerivedMetrics {
    /// Compute all derived metrics from one snapshot.
    pub fn compute(
        snapshot: &Snapshot,
        topology: &CacheTopology,
        thresholds: &AnalysisThresholds,
    ) -> Self {
        let cycles = snapshot.count(keys::CYCLES);
        let instructions = snapshot.count(keys::INSTRUCTIONS);
        let l1_loads = snapshot.count(keys::L1D_LOADS);
        let elapsed = snapshot.elapsed_seconds().filter(|s| *s > 0.0);

        let ipc = ratio(instructions, cycles);
        let cpi = ipc.filter(|v| *v > 0.0).map(|v| 1.0 / v);

        let l1_miss_ratio_pct =
            ratio(snapshot.count(keys::L1D_LOAD_MISSES), l1_loads).map(|r| r * 100.0);
        let l2_hit_rate_pct = ratio(
            snapshot.count(keys::L2_MISSES),
            snapshot.count(keys::L2_REFERENCES),
        )
        .map(|r| 100.0 - r * 100.0);
        let l3_hit_rate_pct = ratio(
            snapshot.count(keys::LLC_LOAD_MISSES),
            snapshot.count(keys::LLC_LOADS),
        )
        .map(|r| 100.0 - r * 100.0);
        let cache_hit_rate_pct = ratio(
            snapshot.count(keys::CACHE_MISSES),
            snapshot.count(keys::CACHE_REFERENCES),
        )
        .map(|r| 100.0 - r * 100.0);
        let branch_miss_rate_pct = ratio(
            snapshot.count(keys::BRANCH_MISSES),
            snapshot.count(keys::BRANCHES),
        )
        .map(|r| r * 100.0);

        let stall_pct = ratio(snapshot.count(keys::STALLS_TOTAL), cycles).map(|r| r * 100.0);
        let memory_stall_pct =
            ratio(snapshot.count(keys::STALLS_MEM_ANY), cycles).map(|r| r * 100.0);
        let memory_intensity = ratio(l1_loads, instructions);

        let fp = FpCounts::gather(snapshot);
        let total_flops = fp.total_flops;
        let gflops = match (total_flops, elapsed) {
            (Some(flops), Some(seconds)) => Some(flops / (seconds * 1e9)),
            _ => None,
        };
        let vectorization_ratio_pct = fp.vectorization_pct(thresholds.fp_noise_floor);

        let operational_intensity = match (total_flops, snapshot.count(keys::LLC_LOAD_MISSES)) {
            (Some(flops), Some(misses)) if misses > 0 => {
                Some(flops / (misses as f64 * topology.line_bytes as f64))
            }
            _ => None,
        };

        let read_bandwidth_gbs = match (snapshot.count(keys::ALL_DATA_READS), elapsed) {
            (Some(reads), Some(seconds)) => {
                Some(reads as f64 * topology.line_bytes as f64 / seconds / BYTES_PER_GIB)
            }
            _ => None,
        };

        let stall_breakdown = StallBreakdown::from_counters(
            snapshot.count(keys::STALLS_L1D_MISS),
            snapshot.count(keys::STALLS_L2_MISS),
            snapshot.count(keys::STALLS_L3_MISS),
        );

        Self {
            ipc,
            cpi,
            l1_miss_ratio_pct,
            l2_hit_rate_pct,
            l3_hit_rate_pct,
            cache_hit_rate_pct,
            branch_miss_rate_pct,
            stall_pct,
            memory_stall_pct,
            memory_intensity,
            scalar_fp_instructions: fp.scalar,
            packed_fp_instructions: fp.packed,
            wide_256_instructions: fp.wide_256,
            wide_512_instructions: fp.wide_512,
            total_flops,
            gflops,
            vectorization_ratio_pct,
            operational_intensity,
            read_bandwidth_gbs,
            stall_breakdown,
        }
    }

    /// Qualitative IPC band, when IPC is computable
    pub fn ipc_band(&self) -> Option<IpcBand> {
        self.ipc.map(IpcBand::classify)
    }

    /// Roofline classification, when operational intensity is computable
    pub fn oi_class(&self, thresholds: &AnalysisThresholds) -> Option<OiClass> {
        self.operational_intensity
            .map(|oi| OiClass::classify(oi, thresholds))
    }

    /// Total FP instructions retired (scalar + packed), when any FP
    /// counter was available
    pub fn fp_instructions(&self) -> Option<u64> {
        match (self.scalar_fp_instructions, self.packed_fp_instructions) {
            (None, None) => None,
            (scalar, packed) => Some(scalar.unwrap_or(0) + packed.unwrap_or(0)),
        }
    }
}

/// Guarded ratio: `None` when either side is unavailable or the
/// denominator is zero.
fn ratio(numerator: Option<u64>, denominator: Option<u64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0 => Some(n as f64 / d as f64),
        _ => None,
    }
}

/// Intermediate FP counter aggregation.
struct FpCounts {
    scalar: Option<u64>,
    packed: Option<u64>,
    wide_256: Option<u64>,
    wide_512: Option<u64>,
    total_flops: Option<f64>,
}

impl FpCounts {
    fn gather(snapshot: &Snapshot) -> Self {
        let mut any = false;
        let mut scalar = 0u64;
        let mut packed = 0u64;
        let mut wide_256 = 0u64;
        let mut wide_512 = 0u64;
        let mut flops = 0.0f64;

        for (key, elements) in FLOP_WEIGHTS {
            let count = match snapshot.count(key) {
                Some(count) => count,
                None => continue,
            };
            any = true;
            flops += count as f64 * *elements as f64;
            if *elements == 1 {
                scalar += count;
            } else {
                packed += count;
            }
            match *key {
                keys::FP_256_SINGLE | keys::FP_256_DOUBLE => wide_256 += count,
                keys::FP_512_SINGLE | keys::FP_512_DOUBLE => wide_512 += count,
                _ => {}
            }
        }

        if any {
            Self {
                scalar: Some(scalar),
                packed: Some(packed),
                wide_256: Some(wide_256),
                wide_512: Some(wide_512),
                total_flops: Some(flops),
            }
        } else {
            Self {
                scalar: None,
                packed: None,
                wide_256: None,
                wide_512: None,
                total_flops: None,
            }
        }
    }

    /// Packed share of FP instructions, gated by the noise floor.
    fn vectorization_pct(&self, noise_floor: u64) -> Option<f64> {
        let scalar = self.scalar?;
        let packed = self.packed?;
        let total = scalar + packed;
        if total <= noise_floor {
            return None;
        }
        Some(packed as f64 / total as f64 * 100.0)
    }
}

/// Qualitative IPC band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IpcBand {
    Severe,
    Low,
    Moderate,
    Good,
    Excellent,
}

impl IpcBand {
    /// Band boundaries: <0.5 severe, <1.5 low, <3.0 moderate,
    /// <4.0 good, else excellent.
    pub fn classify(ipc: f64) -> Self {
        if ipc < 0.5 {
            IpcBand::Severe
        } else if ipc < 1.5 {
            IpcBand::Low
        } else if ipc < 3.0 {
            IpcBand::Moderate
        } else if ipc < 4.0 {
            IpcBand::Good
        } else {
            IpcBand::Excellent
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            IpcBand::Severe => "severe",
            IpcBand::Low => "low",
            IpcBand::Moderate => "moderate",
            IpcBand::Good => "good",
            IpcBand::Excellent => "excellent",
        }
    }
}

/// Roofline classification from operational intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OiClass {
    MemoryBound,
    Balanced,
    ComputeBound,
}

impl OiClass {
    pub fn classify(oi: f64, thresholds: &AnalysisThresholds) -> Self {
        if oi < thresholds.oi_memory_bound {
            OiClass::MemoryBound
        } else if oi <= thresholds.oi_compute_bound {
            OiClass::Balanced
        } else {
            OiClass::ComputeBound
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OiClass::MemoryBound => "memory-bound",
            OiClass::Balanced => "balanced",
            OiClass::ComputeBound => "compute-bound",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse;

    fn derive(record: &str) -> DerivedMetrics {
        let snapshot = parse(record.lines()).expect("test record parses");
        DerivedMetrics::compute(
            &snapshot,
            &CacheTopology::default(),
            &AnalysisThresholds::default(),
        )
    }

    #[test]
    fn ipc_severe_band_scenario() {
        let m = derive(
            "35,116,397,372 cycles\n\
             6,141,273,975 instructions\n",
        );
        let ipc = m.ipc.unwrap();
        assert!((ipc - 0.1749).abs() < 1e-3);
        assert_eq!(m.ipc_band(), Some(IpcBand::Severe));
    }

    #[test]
    fn ipc_is_exact_inverse_of_cpi() {
        let m = derive("1,000,000 cycles\n2,345,678 instructions\n");
        let ipc = m.ipc.unwrap();
        let cpi = m.cpi.unwrap();
        assert!((ipc * cpi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn l2_hit_rate_poor_band_scenario() {
        let m = derive(
            "1,280,709,046 l2_rqsts.references\n\
             800,164,862 l2_rqsts.miss\n",
        );
        let hit = m.l2_hit_rate_pct.unwrap();
        assert!((hit - 37.52).abs() < 0.01);
    }

    #[test]
    fn l1_ratio_above_100_is_reported_as_is() {
        let m = derive(
            "920,707,358 L1-dcache-loads\n\
             976,632,847 L1-dcache-load-misses\n",
        );
        let ratio = m.l1_miss_ratio_pct.unwrap();
        assert!((ratio - 106.07).abs() < 0.01);
    }

    #[test]
    fn missing_denominator_suppresses_metric() {
        let m = derive("1,000 instructions\n");
        assert!(m.ipc.is_none());
        assert!(m.cpi.is_none());
        assert!(m.l1_miss_ratio_pct.is_none());
        assert!(m.stall_breakdown.is_none());
    }

    #[test]
    fn zero_denominator_suppresses_metric() {
        let m = derive("0 cycles\n1,000 instructions\n");
        assert!(m.ipc.is_none());
    }

    #[test]
    fn flops_are_element_weighted() {
        let m = derive(
            "100 fp_arith_inst_retired.scalar_single\n\
             50 fp_arith_inst_retired.scalar_double\n\
             10 fp_arith_inst_retired.256b_packed_single\n\
             5 fp_arith_inst_retired.512b_packed_double\n\
             1 cycles\n",
        );
        // 100 + 50 + 10*8 + 5*8 = 270
        assert_eq!(m.total_flops, Some(270.0));
        assert_eq!(m.scalar_fp_instructions, Some(150));
        assert_eq!(m.packed_fp_instructions, Some(15));
        assert_eq!(m.wide_256_instructions, Some(10));
        assert_eq!(m.wide_512_instructions, Some(5));
    }

    #[test]
    fn vectorization_gated_by_noise_floor() {
        // Tiny FP activity: ratio must be suppressed.
        let quiet = derive(
            "10 fp_arith_inst_retired.scalar_single\n\
             5 fp_arith_inst_retired.256b_packed_single\n\
             1 cycles\n",
        );
        assert!(quiet.vectorization_ratio_pct.is_none());

        let busy = derive(
            "100,000 fp_arith_inst_retired.scalar_single\n\
             300,000 fp_arith_inst_retired.256b_packed_single\n\
             1 cycles\n",
        );
        let pct = busy.vectorization_ratio_pct.unwrap();
        assert!((pct - 75.0).abs() < 1e-9);
    }

    #[test]
    fn bandwidth_uses_binary_gigabytes() {
        let m = derive(
            "16,777,216 offcore_requests.all_data_rd\n\
             1 cycles\n\
             1.000000000 seconds time elapsed\n",
        );
        // 16 Mi lines * 64 B = 1 GiB in one second
        let bw = m.read_bandwidth_gbs.unwrap();
        assert!((bw - 1.0).abs() < 1e-9);
    }

    #[test]
    fn operational_intensity_and_class() {
        let thresholds = AnalysisThresholds::default();
        let m = derive(
            "1,000,000 fp_arith_inst_retired.scalar_single\n\
             1,000 LLC-load-misses\n\
             1,000 LLC-loads\n\
             1 cycles\n",
        );
        // 1e6 flops / (1000 * 64 bytes) = 15.625
        let oi = m.operational_intensity.unwrap();
        assert!((oi - 15.625).abs() < 1e-9);
        assert_eq!(m.oi_class(&thresholds), Some(OiClass::ComputeBound));
    }

    #[test]
    fn percentage_domains_hold() {
        let m = derive(
            "1,000 l2_rqsts.references\n500 l2_rqsts.miss\n\
             1,000 LLC-loads\n100 LLC-load-misses\n\
             1,000 cache-references\n50 cache-misses\n\
             1,000 branches\n10 branch-misses\n",
        );
        for pct in [
            m.l2_hit_rate_pct,
            m.l3_hit_rate_pct,
            m.cache_hit_rate_pct,
            m.branch_miss_rate_pct,
        ] {
            let v = pct.unwrap();
            assert!((0.0..=100.0).contains(&v));
        }
    }
}
