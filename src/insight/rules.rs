//! The ordered rule table
//!
//! Each rule is a data record: a name, a toggle, and an evaluation
//! function over the shared context. Rules are independent; every one
//! guards its own denominators, and a missing input silently skips
//! that rule instead of failing the pass. The table order is the
//! output order and the bottleneck priority order.

use serde_json::json;

use super::types::{Insight, InsightCategory, Severity};
use crate::analysis::stalls::StallTier;
use crate::analysis::{AnalysisThresholds, CacheTopology, DerivedMetrics};
use crate::counters::catalog::keys;
use crate::record::Snapshot;

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub snapshot: &'a Snapshot,
    pub derived: &'a DerivedMetrics,
    pub topology: &'a CacheTopology,
    pub thresholds: &'a AnalysisThresholds,
}

/// A bottleneck claim attached to a rule outcome.
#[derive(Debug, Clone)]
pub struct BottleneckClaim {
    pub label: String,
    /// Claims marked this way only ever fill the primary slot, and
    /// only when nothing before them claimed it.
    pub primary_only_if_unset: bool,
}

/// What one rule produced.
pub struct RuleOutcome {
    pub insight: Option<Insight>,
    pub claim: Option<BottleneckClaim>,
}

impl RuleOutcome {
    /// Warning insight that also claims a bottleneck slot.
    fn warning(
        category: InsightCategory,
        label: &str,
        message: String,
        detail: Option<serde_json::Value>,
    ) -> Self {
        let mut insight = Insight::new(Severity::Warning, category, message);
        if let Some(detail) = detail {
            insight = insight.with_detail(detail);
        }
        Self {
            insight: Some(insight),
            claim: Some(BottleneckClaim {
                label: label.to_string(),
                primary_only_if_unset: false,
            }),
        }
    }

    fn note(severity: Severity, category: InsightCategory, message: String) -> Self {
        Self {
            insight: Some(Insight::new(severity, category, message)),
            claim: None,
        }
    }
}

/// One rule record. `enabled` makes individual rules toggleable data
/// rather than hardcoded control flow.
pub struct Rule {
    pub name: &'static str,
    pub enabled: bool,
    pub eval: fn(&RuleContext<'_>) -> Option<RuleOutcome>,
}

/// The rule table, in evaluation (and therefore bottleneck priority)
/// order. Reordering this list changes the output contract.
pub fn ruleset() -> Vec<Rule> {
    let rule = |name, eval| Rule {
        name,
        enabled: true,
        eval,
    };
    vec![
        rule("total-stall-rate", rule_total_stalls),
        rule("l1-miss-rate", rule_l1_miss_rate),
        rule("ipc-band", rule_ipc),
        rule("l2-miss-rate", rule_l2),
        rule("l3-hit-rate", rule_l3),
        rule("branch-miss-rate", rule_branch),
        rule("tlb-pressure", rule_tlb),
        rule("prefetch-active", rule_prefetch_active),
        rule("vectorization-ratio", rule_vectorization),
        rule("icache-pressure", rule_icache),
        rule("store-bound", rule_store_bound),
        rule("bandwidth-estimate", rule_bandwidth_estimate),
        rule("branch-cost", rule_branch_cost),
        rule("residual-core-stall", rule_residual_stall),
        rule("memory-latency-breakdown", rule_memory_latency),
        rule("operational-intensity", rule_operational_intensity),
        rule("vector-width", rule_vector_width),
        rule("workload-heuristic", rule_workload_heuristic),
        rule("bandwidth-saturation", rule_bandwidth_saturation),
    ]
}

fn rule_total_stalls(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let stall_pct = ctx.derived.stall_pct?;
    if stall_pct <= ctx.thresholds.stall_warn_pct {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::Stall,
        "CPU stalls",
        format!(
            "CPU was stalled for {:.1}% of cycles; the core spends most of its time waiting",
            stall_pct
        ),
        Some(json!({
            "stall_pct": stall_pct,
            "memory_stall_pct": ctx.derived.memory_stall_pct,
        })),
    ))
}

fn rule_l1_miss_rate(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let ratio = ctx.derived.l1_miss_ratio_pct?;
    // The >100% band is prefetch activity, handled by its own rule.
    if ratio <= ctx.thresholds.l1_miss_warn_pct || ratio > 100.0 {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::L1,
        "L1 data cache misses",
        format!(
            "{:.1}% of L1 data loads miss; the working set does not fit the L1 cache",
            ratio
        ),
        Some(json!({ "l1_miss_ratio_pct": ratio })),
    ))
}

fn rule_ipc(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let ipc = ctx.derived.ipc?;
    let band = ctx.derived.ipc_band()?;
    if ipc < ctx.thresholds.ipc_warn {
        return Some(RuleOutcome::warning(
            InsightCategory::Ipc,
            "Low IPC",
            format!(
                "IPC is {:.2} ({}); the pipeline retires far below its width",
                ipc,
                band.name()
            ),
            Some(json!({ "ipc": ipc, "band": band.name() })),
        ));
    }
    if ipc >= ctx.thresholds.ipc_good {
        return Some(RuleOutcome::note(
            Severity::Ok,
            InsightCategory::Ipc,
            format!("Good IPC of {:.2} ({})", ipc, band.name()),
        ));
    }
    None
}

fn rule_l2(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let hit = ctx.derived.l2_hit_rate_pct?;
    let miss = 100.0 - hit;
    if miss > ctx.thresholds.l2_miss_warn_pct {
        let (advice, detail) = if ctx.topology.l2_kb > 0 {
            // Three square f64 tiles must share the L2 working set.
            let l2_bytes = ctx.topology.l2_kb * 1024;
            let tile = ((l2_bytes as f64 / (3.0 * 8.0)).sqrt()).floor() as u64;
            (
                format!(
                    "block loops so three working tiles fit the {} KB L2 (roughly {}x{} doubles)",
                    ctx.topology.l2_kb, tile, tile
                ),
                json!({
                    "l2_miss_pct": miss,
                    "l2_kb": ctx.topology.l2_kb,
                    "recommended_tile": tile,
                }),
            )
        } else {
            (
                "block loops so the working tiles fit the L2 cache".to_string(),
                json!({ "l2_miss_pct": miss }),
            )
        };
        return Some(RuleOutcome::warning(
            InsightCategory::L2,
            "L2 cache misses",
            format!("{:.1}% of L2 requests miss; {}", miss, advice),
            Some(detail),
        ));
    }
    if miss < ctx.thresholds.l2_miss_good_pct {
        return Some(RuleOutcome::note(
            Severity::Ok,
            InsightCategory::L2,
            format!("L2 hit rate is healthy at {:.1}%", hit),
        ));
    }
    None
}

fn rule_l3(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let hit = ctx.derived.l3_hit_rate_pct?;
    if hit < ctx.thresholds.l3_hit_warn_pct {
        return Some(RuleOutcome::warning(
            InsightCategory::L3,
            "L3 / memory traffic",
            format!(
                "L3 hit rate is {:.1}%; misses go to DRAM and risk saturating memory bandwidth",
                hit
            ),
            Some(json!({ "l3_hit_pct": hit })),
        ));
    }
    if hit > ctx.thresholds.l3_hit_excellent_pct {
        return Some(RuleOutcome::note(
            Severity::Ok,
            InsightCategory::L3,
            format!("L3 hit rate is excellent at {:.1}%", hit),
        ));
    }
    None
}

fn rule_branch(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let rate = ctx.derived.branch_miss_rate_pct?;
    if rate > ctx.thresholds.branch_warn_pct {
        return Some(RuleOutcome::warning(
            InsightCategory::Branch,
            "Branch mispredictions",
            format!(
                "{:.2}% of branches mispredict; consider branchless forms or sorting the data",
                rate
            ),
            Some(json!({ "branch_miss_pct": rate })),
        ));
    }
    if rate < ctx.thresholds.branch_excellent_pct {
        return Some(RuleOutcome::note(
            Severity::Ok,
            InsightCategory::Branch,
            format!("Branch prediction is excellent ({:.2}% misses)", rate),
        ));
    }
    None
}

fn rule_tlb(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let misses = ctx.snapshot.count(keys::DTLB_LOAD_MISSES)?;
    let loads = ctx.snapshot.count(keys::L1D_LOADS)?;
    if loads == 0 {
        return None;
    }
    let pct = misses as f64 / loads as f64 * 100.0;
    if pct <= ctx.thresholds.tlb_warn_pct {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::Tlb,
        "TLB misses",
        format!(
            "{:.2}% of loads miss the dTLB; huge pages or denser layouts would cut page walks",
            pct
        ),
        Some(json!({ "dtlb_miss_pct": pct })),
    ))
}

fn rule_prefetch_active(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let ratio = ctx.derived.l1_miss_ratio_pct?;
    if ratio <= 100.0 {
        return None;
    }
    // More L1 misses than demand loads: the prefetchers are fetching
    // ahead of demand. Informational, not a defect.
    Some(RuleOutcome::note(
        Severity::Info,
        InsightCategory::Prefetch,
        format!(
            "Hardware prefetchers are active: L1 miss ratio is {:.1}% of demand loads",
            ratio
        ),
    ))
}

fn rule_vectorization(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let pct = ctx.derived.vectorization_ratio_pct?;
    if pct < ctx.thresholds.vectorization_low_pct {
        return Some(RuleOutcome::warning(
            InsightCategory::Vectorization,
            "Low vectorization",
            format!(
                "Only {:.1}% of FP instructions are vector; check that the hot loops auto-vectorize",
                pct
            ),
            Some(json!({ "vectorization_pct": pct })),
        ));
    }
    if pct > ctx.thresholds.vectorization_high_pct {
        return Some(RuleOutcome::note(
            Severity::Ok,
            InsightCategory::Vectorization,
            format!("FP work is well vectorized ({:.1}% packed)", pct),
        ));
    }
    None
}

fn rule_icache(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let misses = ctx.snapshot.count(keys::L1I_LOAD_MISSES)?;
    let instructions = ctx.snapshot.count(keys::INSTRUCTIONS)?;
    if instructions == 0 {
        return None;
    }
    let mpki = misses as f64 / instructions as f64 * 1000.0;
    if mpki <= ctx.thresholds.icache_mpki_warn {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::Icache,
        "Instruction cache pressure",
        format!(
            "{:.1} instruction-cache misses per kilo-instruction; hot code does not fit the L1I",
            mpki
        ),
        Some(json!({ "icache_mpki": mpki })),
    ))
}

fn rule_store_bound(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let stores = ctx.snapshot.count(keys::LLC_STORES)?;
    let misses = ctx.snapshot.count(keys::LLC_STORE_MISSES)?;
    if stores < ctx.thresholds.store_traffic_floor || stores == 0 {
        return None;
    }
    let pct = misses as f64 / stores as f64 * 100.0;
    if pct <= ctx.thresholds.store_miss_warn_pct {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::Store,
        "Store / RFO traffic",
        format!(
            "{:.1}% of LLC stores miss; write-allocate (RFO) traffic doubles the memory cost of \
             streaming writes, consider non-temporal stores",
            pct
        ),
        Some(json!({ "llc_store_miss_pct": pct, "llc_stores": stores })),
    ))
}

fn rule_bandwidth_estimate(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let bw = ctx.derived.read_bandwidth_gbs?;
    let peak = ctx.thresholds.peak_bandwidth_gbs;
    let util = if peak > 0.0 { bw / peak } else { 0.0 };
    if peak > 0.0 && util > ctx.thresholds.bandwidth_util_warn {
        return Some(RuleOutcome::warning(
            InsightCategory::Bandwidth,
            "Memory bandwidth",
            format!(
                "Estimated read bandwidth {:.1} GB/s is {:.0}% of the {:.0} GB/s peak",
                bw,
                util * 100.0,
                peak
            ),
            Some(json!({ "read_bandwidth_gbs": bw, "utilization": util })),
        ));
    }
    Some(RuleOutcome::note(
        Severity::Info,
        InsightCategory::Bandwidth,
        format!("Estimated read bandwidth: {:.1} GB/s", bw),
    ))
}

fn rule_branch_cost(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let misses = ctx.snapshot.count(keys::BRANCH_MISSES)?;
    let cycles = ctx.snapshot.count(keys::CYCLES)?;
    if cycles == 0 {
        return None;
    }
    let cost_pct = misses as f64 * ctx.thresholds.branch_penalty_cycles as f64
        / cycles as f64
        * 100.0;
    if cost_pct <= ctx.thresholds.branch_cost_warn_pct {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::Branch,
        "Branch misprediction cost",
        format!(
            "Branch mispredictions cost an estimated {:.1}% of cycles ({} cycles charged per miss)",
            cost_pct, ctx.thresholds.branch_penalty_cycles
        ),
        Some(json!({ "branch_cost_pct": cost_pct })),
    ))
}

fn rule_residual_stall(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let total = ctx.snapshot.count(keys::STALLS_TOTAL)?;
    let l1_miss = ctx.snapshot.count(keys::STALLS_L1D_MISS)?;
    let cycles = ctx.snapshot.count(keys::CYCLES)?;
    if cycles == 0 {
        return None;
    }
    let residual_pct = total.saturating_sub(l1_miss) as f64 / cycles as f64 * 100.0;
    if residual_pct <= ctx.thresholds.residual_stall_warn_pct {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::Stall,
        "Core-bound stalls",
        format!(
            "{:.1}% of cycles stall without an outstanding L1 miss; likely execution dependency \
             chains or L1-hit latency",
            residual_pct
        ),
        Some(json!({ "residual_stall_pct": residual_pct })),
    ))
}

fn rule_memory_latency(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let breakdown = ctx.derived.stall_breakdown.as_ref()?;
    let (tier, pct) = breakdown.dominant_tier(ctx.thresholds.tier_dominant_pct)?;
    let label = match tier {
        StallTier::L2Hit => "Memory latency (L2)",
        StallTier::L3Hit => "Memory latency (L3)",
        StallTier::Dram => "Memory latency (DRAM)",
    };
    Some(RuleOutcome::warning(
        InsightCategory::MemoryLatency,
        label,
        format!(
            "{} serves {:.1}% of L1-miss stall time; {}",
            tier.name(),
            pct,
            tier.remediation()
        ),
        Some(json!({
            "dominant_tier": tier.name(),
            "dominant_pct": pct,
            "l2_hit_pct": breakdown.l2_hit_pct(),
            "l3_hit_pct": breakdown.l3_hit_pct(),
            "dram_pct": breakdown.dram_pct(),
        })),
    ))
}

fn rule_operational_intensity(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let oi = ctx.derived.operational_intensity?;
    let class = ctx.derived.oi_class(ctx.thresholds)?;
    let insight = Insight::new(
        Severity::Info,
        InsightCategory::OperationalIntensity,
        format!(
            "Operational intensity is {:.2} FLOPs/byte ({})",
            oi,
            class.name()
        ),
    )
    .with_detail(json!({ "operational_intensity": oi, "class": class.name() }));
    // A memory-bound classification names the bottleneck only when no
    // earlier rule already did.
    let claim = if oi < ctx.thresholds.oi_memory_bound {
        Some(BottleneckClaim {
            label: "Memory-bound (low operational intensity)".to_string(),
            primary_only_if_unset: true,
        })
    } else {
        None
    };
    Some(RuleOutcome {
        insight: Some(insight),
        claim,
    })
}

fn rule_vector_width(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let wide_256 = ctx.derived.wide_256_instructions?;
    let wide_512 = ctx.derived.wide_512_instructions?;
    let combined = wide_256 + wide_512;
    if combined < ctx.thresholds.wide_vector_floor || combined == 0 {
        return None;
    }
    let share = wide_512 as f64 / combined as f64 * 100.0;
    if share >= ctx.thresholds.wide_vector_low_pct {
        return None;
    }
    Some(RuleOutcome::warning(
        InsightCategory::Vectorization,
        "Narrow vector width",
        format!(
            "Only {:.1}% of wide vector instructions use 512-bit lanes; the rest run at half width",
            share
        ),
        Some(json!({ "wide_512_share_pct": share })),
    ))
}

fn rule_workload_heuristic(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let fp = ctx.derived.fp_instructions()?;
    if fp <= ctx.thresholds.heuristic_fp_floor {
        return None;
    }
    let spills_l3 = ctx
        .derived
        .l3_hit_rate_pct
        .map(|hit| 100.0 - hit > ctx.thresholds.heuristic_l3_miss_pct)
        .unwrap_or(false);
    let low_oi = ctx
        .derived
        .operational_intensity
        .map(|oi| oi < ctx.thresholds.heuristic_oi)
        .unwrap_or(false);
    if !spills_l3 && !low_oi {
        return None;
    }
    // Advisory only: platform-specific suggestion, never a bottleneck
    // claim and never correctness-relevant.
    Some(RuleOutcome::note(
        Severity::Info,
        InsightCategory::Recommendation,
        "FP-heavy workload with cache-resident misses; cache-blocked kernels using AVX-512 or AMX \
         tiles typically recover this class of slowdown"
            .to_string(),
    ))
}

fn rule_bandwidth_saturation(ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
    let bw = ctx.derived.read_bandwidth_gbs?;
    let peak = ctx.thresholds.peak_bandwidth_gbs;
    if peak <= 0.0 || bw / peak <= ctx.thresholds.bandwidth_util_warn {
        return None;
    }
    // The estimate rule already reported the number; this claim only
    // labels the bottleneck when nothing earlier did.
    Some(RuleOutcome {
        insight: None,
        claim: Some(BottleneckClaim {
            label: "Memory bandwidth saturation".to_string(),
            primary_only_if_unset: true,
        }),
    })
}
