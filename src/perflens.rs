//! Simple public API for the counter analysis engine
//!
//! This provides a user-friendly interface over the internal pipeline
//! (record parsing, derived metrics, rule evaluation, comparison) so
//! library users do not have to wire the stages together themselves.

use std::path::Path;

use serde::Serialize;

use crate::analysis::{AnalysisThresholds, CacheTopology, CompareThresholds, DerivedMetrics};
use crate::compare::{self, ComparisonResult};
use crate::insight::{self, BottleneckSummary, Insight};
use crate::record::{self, RecordResult, Snapshot};

/// Everything one analysis pass produces for a single record.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub snapshot: Snapshot,
    pub derived: DerivedMetrics,
    pub insights: Vec<Insight>,
    pub bottlenecks: BottleneckSummary,
}

/// Analysis engine facade with fixed topology and thresholds.
///
/// Construction is cheap; the engine holds no handles or background
/// state, so cloning one per thread is fine.
#[derive(Debug, Clone)]
pub struct PerfLens {
    topology: CacheTopology,
    thresholds: AnalysisThresholds,
    compare_thresholds: CompareThresholds,
}

impl PerfLens {
    /// Create a new builder with fluent configuration
    pub fn builder() -> PerfLensBuilder {
        PerfLensBuilder::new()
    }

    /// Create an engine with default topology and thresholds
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn topology(&self) -> &CacheTopology {
        &self.topology
    }

    pub fn thresholds(&self) -> &AnalysisThresholds {
        &self.thresholds
    }

    pub fn compare_thresholds(&self) -> &CompareThresholds {
        &self.compare_thresholds
    }

    /// Parse and analyze one `perf stat` output file
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> RecordResult<Analysis> {
        let snapshot = record::parse_file(path)?;
        Ok(self.analyze(snapshot))
    }

    /// Parse and analyze counter text already in memory
    pub fn analyze_str(&self, text: &str) -> RecordResult<Analysis> {
        let snapshot = record::parse(text.lines())?;
        Ok(self.analyze(snapshot))
    }

    /// Run derived metrics and the rule table over a parsed snapshot
    pub fn analyze(&self, snapshot: Snapshot) -> Analysis {
        let derived = DerivedMetrics::compute(&snapshot, &self.topology, &self.thresholds);
        let ctx = insight::RuleContext {
            snapshot: &snapshot,
            derived: &derived,
            topology: &self.topology,
            thresholds: &self.thresholds,
        };
        let (insights, bottlenecks) = insight::evaluate(&insight::ruleset(), &ctx);
        log::debug!(
            "analysis complete: {} events, {} insights, primary={:?}",
            snapshot.len(),
            insights.len(),
            bottlenecks.primary
        );
        Analysis {
            snapshot,
            derived,
            insights,
            bottlenecks,
        }
    }

    /// Parse and compare two `perf stat` output files
    pub fn compare_files<P: AsRef<Path>>(
        &self,
        baseline: P,
        candidate: P,
    ) -> RecordResult<ComparisonResult> {
        let baseline = record::parse_file(baseline)?;
        let candidate = record::parse_file(candidate)?;
        Ok(self.compare(&baseline, &candidate))
    }

    /// Compare two parsed snapshots
    pub fn compare(&self, baseline: &Snapshot, candidate: &Snapshot) -> ComparisonResult {
        compare::compare(
            baseline,
            candidate,
            &self.topology,
            &self.thresholds,
            &self.compare_thresholds,
        )
    }
}

impl Default for PerfLens {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent builder for [`PerfLens`].
#[derive(Debug, Clone, Default)]
pub struct PerfLensBuilder {
    topology: CacheTopology,
    thresholds: AnalysisThresholds,
    compare_thresholds: CompareThresholds,
}

impl PerfLensBuilder {
    /// Create new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache topology used for tiling advice and line-size math
    pub fn topology(mut self, topology: CacheTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set L2 capacity in KiB (0 means unknown, suppresses tiling advice)
    pub fn l2_kb(mut self, l2_kb: u64) -> Self {
        self.topology.l2_kb = l2_kb;
        self
    }

    /// Set L3 capacity in KiB (0 means unknown)
    pub fn l3_kb(mut self, l3_kb: u64) -> Self {
        self.topology.l3_kb = l3_kb;
        self
    }

    /// Replace the analysis threshold table wholesale
    pub fn thresholds(mut self, thresholds: AnalysisThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replace the comparison threshold table wholesale
    pub fn compare_thresholds(mut self, thresholds: CompareThresholds) -> Self {
        self.compare_thresholds = thresholds;
        self
    }

    pub fn build(self) -> PerfLens {
        PerfLens {
            topology: self.topology,
            thresholds: self.thresholds,
            compare_thresholds: self.compare_thresholds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_runs_the_full_pipeline() {
        let engine = PerfLens::new();
        let analysis = engine
            .analyze_str(
                "35,116,397,372 cycles\n\
                 6,141,273,975 instructions # 0.17 insn per cycle\n",
            )
            .unwrap();
        let ipc = analysis.derived.ipc.unwrap();
        assert!((ipc - 0.1749).abs() < 0.001);
        assert!(analysis
            .insights
            .iter()
            .any(|i| i.message.contains("pipeline retires far below")));
        assert_eq!(analysis.bottlenecks.primary.as_deref(), Some("Low IPC"));
    }

    #[test]
    fn builder_topology_feeds_tiling_detail() {
        let engine = PerfLens::builder().l2_kb(512).build();
        let analysis = engine
            .analyze_str(
                "1,000,000 l2_rqsts.references\n\
                 800,000 l2_rqsts.miss\n",
            )
            .unwrap();
        let l2 = analysis
            .insights
            .iter()
            .find(|i| i.message.contains("L2 requests miss"))
            .unwrap();
        assert_eq!(l2.detail.as_ref().unwrap()["l2_kb"], 512);
    }

    #[test]
    fn compare_files_round_trips_through_the_parser() {
        let dir = std::env::temp_dir();
        let base = dir.join("perflens_facade_base.txt");
        let cand = dir.join("perflens_facade_cand.txt");
        std::fs::write(&base, "1,000 cycles\n0.400000000 seconds time elapsed\n").unwrap();
        std::fs::write(&cand, "900 cycles\n0.200000000 seconds time elapsed\n").unwrap();
        let result = PerfLens::new().compare_files(&base, &cand).unwrap();
        assert!(result.speed.is_some());
        let _ = std::fs::remove_file(&base);
        let _ = std::fs::remove_file(&cand);
    }
}
