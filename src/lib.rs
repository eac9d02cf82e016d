//! perflens - hardware performance-counter analysis
//!
//! Parses `perf stat` style counter recordings and turns raw counts
//! into actionable findings.
//!
//! # Features
//!
//! - **Record parsing**: perf-stat text format, including `<not counted>`
//!   sentinels and rate annotations
//! - **Derived metrics**: IPC, cache hit rates, stall decomposition,
//!   FLOPs, vectorization ratio, operational intensity, bandwidth
//! - **Bottleneck classification**: an ordered rule table whose first
//!   warning claims become the primary and secondary bottleneck
//! - **Run comparison**: per-event deltas, per-side derived metrics,
//!   time-governed speedup, and qualitative explanations
//! - **Unavailable is not zero**: metrics missing an input counter come
//!   out as not-computable instead of silently wrong
//!
//! # Example
//!
//! ```no_run
//! use perflens::PerfLens;
//!
//! # fn main() -> Result<(), perflens::record::RecordError> {
//! let engine = PerfLens::builder().l2_kb(1024).build();
//! let analysis = engine.analyze_file("counters.txt")?;
//! if let Some(primary) = &analysis.bottlenecks.primary {
//!     println!("primary bottleneck: {}", primary);
//! }
//! # Ok(())
//! # }
//! ```

// Public API modules
pub mod perflens;
pub mod prelude;

// CLI module (for binary)
#[cfg(feature = "cli")]
pub mod cli;

// Analysis pipeline modules
pub mod analysis;
pub mod compare;
pub mod counters;
pub mod insight;
pub mod record;
pub mod report;

// Re-export the public API at the crate root for convenience
pub use crate::perflens::{Analysis, PerfLens, PerfLensBuilder};
pub use prelude::*;
