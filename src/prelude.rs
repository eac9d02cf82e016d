//! perflens prelude - convenient imports for users
//!
//! This module provides everything users need to drive the analysis
//! engine from library code.

// Re-export the public API
pub use crate::perflens::{Analysis, PerfLens, PerfLensBuilder};

// Re-export essential error types that users might need
pub use crate::record::{RecordError, RecordResult, Snapshot};

// Re-export the analysis value objects users inspect
pub use crate::analysis::{
    AnalysisThresholds, CacheTopology, CompareThresholds, DerivedMetrics,
};
pub use crate::compare::{ComparisonResult, SpeedChange};
pub use crate::insight::{BottleneckSummary, Insight, InsightCategory, Severity};
pub use crate::report::Theme;
