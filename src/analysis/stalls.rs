//! Nested stall decomposition
//!
//! The stall counters nest: every cycle stalled on an L3 miss is also
//! stalled on an L2 miss and an L1 miss, so the narrower counter is a
//! subset of the wider one. Subtracting adjacent levels attributes
//! stall time to the tier that actually serviced the data:
//!
//! - L2-hit stalls  = stalls(L1 miss) - stalls(L2 miss)
//! - L3-hit stalls  = stalls(L2 miss) - stalls(L3 miss)
//! - DRAM stalls    = stalls(L3 miss)
//!
//! Counter multiplexing can make a narrower counter read slightly
//! higher than its parent; negative components are clamped to zero so
//! measurement noise never produces a negative duration.

use serde::Serialize;

/// Where L1-miss stall cycles were spent, by serving tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StallBreakdown {
    /// Total cycles stalled on an outstanding L1 miss
    pub l1_miss_stall_cycles: u64,
    /// Cycles attributed to loads served from L2
    pub l2_hit_cycles: u64,
    /// Cycles attributed to loads served from L3
    pub l3_hit_cycles: u64,
    /// Cycles attributed to loads served from DRAM
    pub dram_cycles: u64,
}

impl StallBreakdown {
    /// Decompose the three nested stall counters. Returns `None` when
    /// any input is unavailable or no L1-miss stalls were recorded.
    pub fn from_counters(
        stalls_l1d_miss: Option<u64>,
        stalls_l2_miss: Option<u64>,
        stalls_l3_miss: Option<u64>,
    ) -> Option<Self> {
        let l1 = stalls_l1d_miss?;
        let l2 = stalls_l2_miss?;
        let l3 = stalls_l3_miss?;
        if l1 == 0 {
            return None;
        }
        Some(Self {
            l1_miss_stall_cycles: l1,
            l2_hit_cycles: l1.saturating_sub(l2),
            l3_hit_cycles: l2.saturating_sub(l3),
            dram_cycles: l3,
        })
    }

    /// L2-hit share of L1-miss stall cycles, in percent
    pub fn l2_hit_pct(&self) -> f64 {
        self.share(self.l2_hit_cycles)
    }

    /// L3-hit share of L1-miss stall cycles, in percent
    pub fn l3_hit_pct(&self) -> f64 {
        self.share(self.l3_hit_cycles)
    }

    /// DRAM share of L1-miss stall cycles, in percent
    pub fn dram_pct(&self) -> f64 {
        self.share(self.dram_cycles)
    }

    /// The tier holding more than `dominant_pct` of L1-miss stalls, if any
    pub fn dominant_tier(&self, dominant_pct: f64) -> Option<(StallTier, f64)> {
        let tiers = [
            (StallTier::L2Hit, self.l2_hit_pct()),
            (StallTier::L3Hit, self.l3_hit_pct()),
            (StallTier::Dram, self.dram_pct()),
        ];
        tiers
            .into_iter()
            .find(|(_, pct)| *pct > dominant_pct)
    }

    fn share(&self, cycles: u64) -> f64 {
        (cycles as f64 / self.l1_miss_stall_cycles as f64) * 100.0
    }
}

/// Tier a dominant share of memory-latency stalls is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StallTier {
    L2Hit,
    L3Hit,
    Dram,
}

impl StallTier {
    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            StallTier::L2Hit => "L2",
            StallTier::L3Hit => "L3",
            StallTier::Dram => "DRAM",
        }
    }

    /// Tier-specific remediation advice
    pub fn remediation(&self) -> &'static str {
        match self {
            StallTier::L2Hit => {
                "working set spills L1; tighten inner-loop footprint or add software prefetch"
            }
            StallTier::L3Hit => {
                "working set spills L2; block loops for the L2 cache and reuse tiles before moving on"
            }
            StallTier::Dram => {
                "working set spills the last-level cache; restructure for locality or stream with non-temporal accesses"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_sum_to_l1_miss_stalls() {
        let b = StallBreakdown::from_counters(Some(1000), Some(600), Some(250)).unwrap();
        assert_eq!(b.l2_hit_cycles, 400);
        assert_eq!(b.l3_hit_cycles, 350);
        assert_eq!(b.dram_cycles, 250);
        assert_eq!(
            b.l2_hit_cycles + b.l3_hit_cycles + b.dram_cycles,
            b.l1_miss_stall_cycles
        );
    }

    #[test]
    fn noise_clamps_to_zero_never_negative() {
        // Multiplexed counters can invert the nesting.
        let b = StallBreakdown::from_counters(Some(500), Some(520), Some(510)).unwrap();
        assert_eq!(b.l2_hit_cycles, 0);
        assert_eq!(b.l3_hit_cycles, 10);
        assert_eq!(b.dram_cycles, 510);
    }

    #[test]
    fn unavailable_counter_suppresses_breakdown() {
        assert!(StallBreakdown::from_counters(Some(1000), None, Some(100)).is_none());
        assert!(StallBreakdown::from_counters(None, Some(1), Some(1)).is_none());
        assert!(StallBreakdown::from_counters(Some(0), Some(0), Some(0)).is_none());
    }

    #[test]
    fn dominant_tier_requires_majority() {
        let b = StallBreakdown::from_counters(Some(1000), Some(600), Some(550)).unwrap();
        // DRAM holds 55% of the stalls.
        let (tier, pct) = b.dominant_tier(50.0).unwrap();
        assert_eq!(tier, StallTier::Dram);
        assert!((pct - 55.0).abs() < 1e-9);

        let even = StallBreakdown::from_counters(Some(900), Some(600), Some(300)).unwrap();
        assert!(even.dominant_tier(50.0).is_none());
    }
}
