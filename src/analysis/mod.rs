//! Derived-metric computation
//!
//! Pure functions from a [`Snapshot`](crate::record::Snapshot) to
//! value objects. Every ratio guards its denominator: a zero or
//! unavailable input makes the corresponding output not-computable
//! (`None`), never a numeric fault. Nothing here is mutated after
//! construction; each analysis call recomputes from scratch.

pub mod derived;
pub mod stalls;
pub mod thresholds;

pub use derived::DerivedMetrics;
pub use stalls::StallBreakdown;
pub use thresholds::{AnalysisThresholds, CompareThresholds};

use serde::{Deserialize, Serialize};

/// Environment facts about the machine the record was taken on.
///
/// Cache sizes come from an external discovery step (0 = unknown) and
/// only parameterize advice text in insights; they never gate whether
/// a rule fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTopology {
    /// Detected L2 cache size in KB, 0 when unknown
    pub l2_kb: u64,
    /// Detected L3 cache size in KB, 0 when unknown
    pub l3_kb: u64,
    /// Cache line size in bytes
    pub line_bytes: u64,
}

impl Default for CacheTopology {
    fn default() -> Self {
        Self {
            l2_kb: 0,
            l3_kb: 0,
            line_bytes: 64,
        }
    }
}
