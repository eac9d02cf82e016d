//! Host cache topology detection
//!
//! Reads per-level cache sizes from sysfs so tiling advice can use the
//! machine the record was taken on. Detection is best-effort: any level
//! that cannot be read stays 0, which downstream treats as unknown and
//! uses to suppress capacity-specific advice.

use std::path::Path;

use crate::analysis::CacheTopology;

const CACHE_DIR: &str = "/sys/devices/system/cpu/cpu0/cache";

/// Detect L2/L3 capacity from sysfs. Never fails; unknown levels are 0.
pub fn detect_topology() -> CacheTopology {
    let mut topology = CacheTopology::default();
    topology.l2_kb = read_level_kb(Path::new(CACHE_DIR), 2).unwrap_or(0);
    topology.l3_kb = read_level_kb(Path::new(CACHE_DIR), 3).unwrap_or(0);
    log::debug!(
        "detected cache topology: L2={} KiB, L3={} KiB",
        topology.l2_kb,
        topology.l3_kb
    );
    topology
}

/// Find the index entry for `level` and parse its size file.
///
/// Index numbers do not map 1:1 to levels (index0/index1 are usually
/// the split L1), so each index's `level` file is checked.
fn read_level_kb(cache_dir: &Path, level: u32) -> Option<u64> {
    let entries = std::fs::read_dir(cache_dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("index"))
        {
            continue;
        }
        let entry_level = std::fs::read_to_string(path.join("level"))
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok());
        if entry_level != Some(level) {
            continue;
        }
        let size = std::fs::read_to_string(path.join("size")).ok()?;
        return parse_size_kb(size.trim());
    }
    None
}

/// Parse a sysfs cache size string ("1024K", "36M") into KiB.
fn parse_size_kb(size: &str) -> Option<u64> {
    if let Some(kb) = size.strip_suffix('K') {
        return kb.parse().ok();
    }
    if let Some(mb) = size.strip_suffix('M') {
        return mb.parse::<u64>().ok().map(|mb| mb * 1024);
    }
    // Raw byte count, seen on some kernels
    size.parse::<u64>().ok().map(|bytes| bytes / 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_suffixes_parse_to_kib() {
        assert_eq!(parse_size_kb("1024K"), Some(1024));
        assert_eq!(parse_size_kb("36M"), Some(36 * 1024));
        assert_eq!(parse_size_kb("32768"), Some(32));
        assert_eq!(parse_size_kb("huge"), None);
    }

    #[test]
    fn detection_never_panics_without_sysfs() {
        // On machines without the sysfs layout both levels stay 0.
        let topology = read_level_kb(Path::new("/nonexistent"), 2);
        assert_eq!(topology, None);
    }
}
