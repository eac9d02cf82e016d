//! Baseline/candidate comparison
//!
//! Diffs two snapshots: per-event percentage deltas, independently
//! recomputed derived metrics for each side, a time-governed
//! speedup/slowdown factor, and a small set of opportunistic
//! explanation findings that say *why* the runs differ.

pub mod engine;
pub mod types;

pub use engine::compare;
pub use types::{ChangeBand, ComparisonResult, EventDelta, SpeedChange};
