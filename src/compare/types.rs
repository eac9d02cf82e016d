//! Comparison value objects

use serde::Serialize;

use crate::analysis::DerivedMetrics;

/// Display-emphasis band for one per-event change.
///
/// The band only reflects sign and magnitude; whether a decrease is
/// actually an improvement depends on the metric (fewer misses good,
/// fewer instructions usually good, fewer FLOPs maybe not), and that
/// meaning is left to the renderer or caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeBand {
    /// Change below -5%
    Improvement,
    /// Change above +5%
    Regression,
    /// Within the +/-5% noise band
    Neutral,
}

/// One per-event comparison row.
#[derive(Debug, Clone, Serialize)]
pub struct EventDelta {
    pub event: String,
    /// Baseline count; `None` when absent or sentinel-valued there
    pub baseline: Option<u64>,
    /// Candidate count; `None` when absent or sentinel-valued there
    pub candidate: Option<u64>,
    /// Percent change; 0 when the baseline is zero or unavailable
    /// (change is undefined, not infinite, without a baseline)
    pub pct_change: f64,
    pub band: ChangeBand,
}

/// Whole-run time factor, governed by elapsed time, not cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SpeedChange {
    /// Candidate ran faster: baseline / candidate elapsed
    Speedup(f64),
    /// Candidate ran slower: candidate / baseline elapsed
    Slowdown(f64),
}

impl SpeedChange {
    pub fn factor(&self) -> f64 {
        match self {
            SpeedChange::Speedup(f) | SpeedChange::Slowdown(f) => *f,
        }
    }
}

/// Everything the comparator produces. Built once from two snapshots,
/// read-only afterward.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    /// Per-event rows for the union of both snapshots' events, in key order
    pub events: Vec<EventDelta>,
    /// Derived metrics recomputed for the baseline snapshot
    pub baseline_derived: DerivedMetrics,
    /// Derived metrics recomputed for the candidate snapshot
    pub candidate_derived: DerivedMetrics,
    /// Candidate minus baseline elapsed seconds, when both are known
    pub elapsed_delta_seconds: Option<f64>,
    /// Speedup/slowdown; `None` when elapsed times are equal or unknown
    pub speed: Option<SpeedChange>,
    /// Qualitative explanation findings; never empty (a no-change
    /// fallback message is emitted when nothing triggers)
    pub explanations: Vec<String>,
}
