//! Insight and bottleneck-summary types

use serde::Serialize;

/// How strongly a finding should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Positive note: the metric looks healthy
    Ok,
    /// Neutral information, neither praise nor complaint
    Info,
    /// Likely contributor to poor performance
    Warning,
}

/// What aspect of the machine a finding concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsightCategory {
    Stall,
    L1,
    L2,
    L3,
    Ipc,
    Branch,
    Tlb,
    Icache,
    Store,
    Vectorization,
    Bandwidth,
    MemoryLatency,
    Prefetch,
    OperationalIntensity,
    Recommendation,
}

/// One diagnostic finding.
///
/// Insights are produced in rule-evaluation order and consumed in one
/// pass; they are never stored between analyses. The detail payload
/// carries structured numbers (percentages, recommended tile sizes)
/// for renderers that want more than the message line.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub severity: Severity,
    pub category: InsightCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl Insight {
    pub fn new(severity: Severity, category: InsightCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// The suspected primary and secondary cause of poor performance,
/// filled by the first claims in rule-evaluation order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BottleneckSummary {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl BottleneckSummary {
    /// True when no rule claimed a bottleneck
    pub fn is_clean(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}
