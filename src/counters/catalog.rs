//! Static event catalog
//!
//! Maps raw counter keys to a category and display label. The table is
//! declarative data, fixed at process start; unknown keys still
//! classify (as [`EventCategory::Other`] with the raw key as label) so
//! counters from newer tooling versions render instead of disappearing.

use serde::{Deserialize, Serialize};

/// Well-known counter keys used by the derived-metric formulas.
///
/// These match the event names emitted by the collection tool so the
/// parser can stay a dumb pass-through.
pub mod keys {
    pub const CYCLES: &str = "cycles";
    pub const INSTRUCTIONS: &str = "instructions";
    pub const BRANCHES: &str = "branches";
    pub const BRANCH_MISSES: &str = "branch-misses";
    pub const CACHE_REFERENCES: &str = "cache-references";
    pub const CACHE_MISSES: &str = "cache-misses";

    pub const L1D_LOADS: &str = "L1-dcache-loads";
    pub const L1D_LOAD_MISSES: &str = "L1-dcache-load-misses";
    pub const L1D_STORES: &str = "L1-dcache-stores";
    pub const L1I_LOAD_MISSES: &str = "L1-icache-load-misses";

    pub const L2_REFERENCES: &str = "l2_rqsts.references";
    pub const L2_MISSES: &str = "l2_rqsts.miss";

    pub const LLC_LOADS: &str = "LLC-loads";
    pub const LLC_LOAD_MISSES: &str = "LLC-load-misses";
    pub const LLC_STORES: &str = "LLC-stores";
    pub const LLC_STORE_MISSES: &str = "LLC-store-misses";

    pub const DTLB_LOADS: &str = "dTLB-loads";
    pub const DTLB_LOAD_MISSES: &str = "dTLB-load-misses";
    pub const ITLB_LOAD_MISSES: &str = "iTLB-load-misses";

    pub const STALLS_TOTAL: &str = "cycle_activity.stalls_total";
    pub const STALLS_MEM_ANY: &str = "cycle_activity.stalls_mem_any";
    pub const STALLS_L1D_MISS: &str = "cycle_activity.stalls_l1d_miss";
    pub const STALLS_L2_MISS: &str = "cycle_activity.stalls_l2_miss";
    pub const STALLS_L3_MISS: &str = "cycle_activity.stalls_l3_miss";

    pub const ALL_DATA_READS: &str = "offcore_requests.all_data_rd";

    pub const FP_SCALAR_SINGLE: &str = "fp_arith_inst_retired.scalar_single";
    pub const FP_SCALAR_DOUBLE: &str = "fp_arith_inst_retired.scalar_double";
    pub const FP_128_SINGLE: &str = "fp_arith_inst_retired.128b_packed_single";
    pub const FP_128_DOUBLE: &str = "fp_arith_inst_retired.128b_packed_double";
    pub const FP_256_SINGLE: &str = "fp_arith_inst_retired.256b_packed_single";
    pub const FP_256_DOUBLE: &str = "fp_arith_inst_retired.256b_packed_double";
    pub const FP_512_SINGLE: &str = "fp_arith_inst_retired.512b_packed_single";
    pub const FP_512_DOUBLE: &str = "fp_arith_inst_retired.512b_packed_double";

    pub const TOPDOWN_RETIRING: &str = "topdown-retiring";
    pub const TOPDOWN_BAD_SPEC: &str = "topdown-bad-spec";
    pub const TOPDOWN_FE_BOUND: &str = "topdown-fe-bound";
    pub const TOPDOWN_BE_BOUND: &str = "topdown-be-bound";
}

/// Display category for a counter event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventCategory {
    Cpu,
    L1,
    L2,
    L3,
    Cache,
    Stalls,
    MemoryBw,
    Flops,
    TopDown,
    Branch,
    Tlb,
    Other,
}

impl EventCategory {
    /// Human-readable category heading
    pub fn heading(&self) -> &'static str {
        match self {
            EventCategory::Cpu => "CPU",
            EventCategory::L1 => "L1 Cache",
            EventCategory::L2 => "L2 Cache",
            EventCategory::L3 => "L3 Cache",
            EventCategory::Cache => "Cache (overall)",
            EventCategory::Stalls => "Stall Cycles",
            EventCategory::MemoryBw => "Memory Bandwidth",
            EventCategory::Flops => "Floating Point",
            EventCategory::TopDown => "Top-Down",
            EventCategory::Branch => "Branch",
            EventCategory::Tlb => "TLB",
            EventCategory::Other => "Other",
        }
    }

    /// All categories in report display order
    pub fn display_order() -> &'static [EventCategory] {
        &[
            EventCategory::Cpu,
            EventCategory::Stalls,
            EventCategory::L1,
            EventCategory::L2,
            EventCategory::L3,
            EventCategory::Cache,
            EventCategory::Tlb,
            EventCategory::Branch,
            EventCategory::MemoryBw,
            EventCategory::Flops,
            EventCategory::TopDown,
            EventCategory::Other,
        ]
    }
}

/// One catalog row: (raw key, category, display label)
type CatalogEntry = (&'static str, EventCategory, &'static str);

/// The catalog itself. Order within a category is the order rows are
/// rendered in the report table.
static CATALOG: &[CatalogEntry] = &[
    (keys::CYCLES, EventCategory::Cpu, "CPU Cycles"),
    (keys::INSTRUCTIONS, EventCategory::Cpu, "Instructions Retired"),
    (keys::STALLS_TOTAL, EventCategory::Stalls, "Stalled Cycles (total)"),
    (keys::STALLS_MEM_ANY, EventCategory::Stalls, "Stalled Cycles (memory)"),
    (keys::STALLS_L1D_MISS, EventCategory::Stalls, "Stalls on L1D Miss"),
    (keys::STALLS_L2_MISS, EventCategory::Stalls, "Stalls on L2 Miss"),
    (keys::STALLS_L3_MISS, EventCategory::Stalls, "Stalls on L3 Miss"),
    (keys::L1D_LOADS, EventCategory::L1, "L1D Loads"),
    (keys::L1D_LOAD_MISSES, EventCategory::L1, "L1D Load Misses"),
    (keys::L1D_STORES, EventCategory::L1, "L1D Stores"),
    (keys::L1I_LOAD_MISSES, EventCategory::L1, "L1I Load Misses"),
    (keys::L2_REFERENCES, EventCategory::L2, "L2 References"),
    (keys::L2_MISSES, EventCategory::L2, "L2 Misses"),
    (keys::LLC_LOADS, EventCategory::L3, "LLC Loads"),
    (keys::LLC_LOAD_MISSES, EventCategory::L3, "LLC Load Misses"),
    (keys::LLC_STORES, EventCategory::L3, "LLC Stores"),
    (keys::LLC_STORE_MISSES, EventCategory::L3, "LLC Store Misses"),
    (keys::CACHE_REFERENCES, EventCategory::Cache, "Cache References"),
    (keys::CACHE_MISSES, EventCategory::Cache, "Cache Misses"),
    (keys::DTLB_LOADS, EventCategory::Tlb, "dTLB Loads"),
    (keys::DTLB_LOAD_MISSES, EventCategory::Tlb, "dTLB Load Misses"),
    (keys::ITLB_LOAD_MISSES, EventCategory::Tlb, "iTLB Load Misses"),
    (keys::BRANCHES, EventCategory::Branch, "Branch Instructions"),
    (keys::BRANCH_MISSES, EventCategory::Branch, "Branch Misses"),
    (keys::ALL_DATA_READS, EventCategory::MemoryBw, "All Data Reads (offcore)"),
    (keys::FP_SCALAR_SINGLE, EventCategory::Flops, "Scalar Single FP"),
    (keys::FP_SCALAR_DOUBLE, EventCategory::Flops, "Scalar Double FP"),
    (keys::FP_128_SINGLE, EventCategory::Flops, "128-bit Packed Single FP"),
    (keys::FP_128_DOUBLE, EventCategory::Flops, "128-bit Packed Double FP"),
    (keys::FP_256_SINGLE, EventCategory::Flops, "256-bit Packed Single FP"),
    (keys::FP_256_DOUBLE, EventCategory::Flops, "256-bit Packed Double FP"),
    (keys::FP_512_SINGLE, EventCategory::Flops, "512-bit Packed Single FP"),
    (keys::FP_512_DOUBLE, EventCategory::Flops, "512-bit Packed Double FP"),
    (keys::TOPDOWN_RETIRING, EventCategory::TopDown, "Retiring"),
    (keys::TOPDOWN_BAD_SPEC, EventCategory::TopDown, "Bad Speculation"),
    (keys::TOPDOWN_FE_BOUND, EventCategory::TopDown, "Frontend Bound"),
    (keys::TOPDOWN_BE_BOUND, EventCategory::TopDown, "Backend Bound"),
];

/// Classify a raw counter key.
///
/// Pure lookup with no failure path: keys the catalog has never heard
/// of come back as `Other` with the raw key as their label.
pub fn classify(event_key: &str) -> (EventCategory, &str) {
    for (key, category, label) in CATALOG {
        if *key == event_key {
            return (*category, label);
        }
    }
    (EventCategory::Other, event_key)
}

/// Catalog keys in table order, used to build the collection command
/// line and to order report rows.
pub fn known_keys() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(key, _, _)| *key)
}

/// Event list passed to the collection tool when recording.
///
/// Top-down counters are excluded: they are only available under a
/// dedicated collection mode and requesting them alongside the raw
/// events causes multiplexing noise on older kernels.
pub fn recording_events() -> Vec<&'static str> {
    CATALOG
        .iter()
        .filter(|(_, category, _)| *category != EventCategory::TopDown)
        .map(|(key, _, _)| *key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_key_classifies_with_label() {
        let (category, label) = classify(keys::L1D_LOAD_MISSES);
        assert_eq!(category, EventCategory::L1);
        assert_eq!(label, "L1D Load Misses");
    }

    #[test]
    fn unknown_key_falls_back_to_other() {
        let (category, label) = classify("uncore_imc.cas_count_read");
        assert_eq!(category, EventCategory::Other);
        assert_eq!(label, "uncore_imc.cas_count_read");
    }

    #[test]
    fn recording_events_exclude_topdown() {
        let events = recording_events();
        assert!(!events.is_empty());
        assert!(events.iter().all(|key| !key.starts_with("topdown-")));
        assert!(events.contains(&keys::CYCLES));
    }
}
