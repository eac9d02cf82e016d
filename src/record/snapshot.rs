//! Immutable snapshot of one recorded run

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// All counters and the elapsed time for one recorded run.
///
/// Counts are non-negative and an absent key means "not available",
/// which is distinct from zero: derived metrics depending on an absent
/// counter come out as not-computable instead of dividing by or
/// multiplying with a bogus zero. Snapshots are built once by the
/// parser and read-only afterward; a comparison holds two independent
/// snapshots and never merges them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    events: BTreeMap<String, u64>,
    /// Display-only rate annotations carried over from the record
    /// (`# 3.1 insn per cycle` and friends). Never used in arithmetic;
    /// derived metrics are always recomputed from raw counts.
    rates: BTreeMap<String, String>,
    /// Counters the source reported as sentinel ("not counted" /
    /// "not supported"). Kept so reports can show the row as
    /// unavailable rather than silently dropping it.
    not_counted: BTreeSet<String>,
    elapsed_seconds: Option<f64>,
}

impl Snapshot {
    pub(crate) fn new(
        events: BTreeMap<String, u64>,
        rates: BTreeMap<String, String>,
        not_counted: BTreeSet<String>,
        elapsed_seconds: Option<f64>,
    ) -> Self {
        Self {
            events,
            rates,
            not_counted,
            elapsed_seconds,
        }
    }

    /// Count for an event, `None` when absent or sentinel-valued
    pub fn count(&self, event_key: &str) -> Option<u64> {
        self.events.get(event_key).copied()
    }

    /// Display-only rate annotation for an event, if the record had one
    pub fn rate(&self, event_key: &str) -> Option<&str> {
        self.rates.get(event_key).map(String::as_str)
    }

    /// Whether the source explicitly reported this counter as unavailable
    pub fn is_not_counted(&self, event_key: &str) -> bool {
        self.not_counted.contains(event_key)
    }

    /// Elapsed wall time in seconds, if the record stated one
    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.elapsed_seconds
    }

    /// Iterate over (key, count) pairs in key order
    pub fn events(&self) -> impl Iterator<Item = (&str, u64)> {
        self.events.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// All keys this snapshot knows about, counted or sentinel-valued
    pub fn event_keys(&self) -> BTreeSet<&str> {
        self.events
            .keys()
            .map(String::as_str)
            .chain(self.not_counted.iter().map(String::as_str))
            .collect()
    }

    /// Number of counted events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events were counted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
