//! Bottleneck classification
//!
//! An ordered, declarative rule table is evaluated left-to-right over
//! a snapshot and its derived metrics. Each rule may emit at most one
//! insight and may claim the bottleneck slot. The first two
//! warning-level claims become the primary and secondary bottleneck;
//! this is a first-match ordering contract, not a severity sort, so
//! rule order is part of the output contract.

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::evaluate;
pub use rules::{ruleset, Rule, RuleContext};
pub use types::{BottleneckSummary, Insight, InsightCategory, Severity};
