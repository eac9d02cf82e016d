//! Record parser
//!
//! Reads the line-oriented counter dump produced by the collection
//! step. The line set varies by platform and tool version, so the
//! parser is deliberately permissive: anything it cannot read as a
//! counter line is skipped (with a debug log), never fatal. Only a
//! missing file or a record with no usable content at all is an error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{RecordError, RecordResult, Snapshot};

/// Parse a record file from disk.
pub fn parse_file<P: AsRef<Path>>(path: P) -> RecordResult<Snapshot> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RecordError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse(content.lines())
}

/// Parse a record from its text lines.
///
/// Line shapes handled:
/// - `<count> <event-key> [# <rate annotation>]`: counter line; the
///   count may use digit-grouping commas
/// - `<not counted> <event-key>` / `<not supported> <event-key>`:
///   sentinel; the event is recorded as unavailable, not as zero
/// - `<seconds> seconds time elapsed`: captured into the snapshot's
///   elapsed-time field and excluded from the event map
/// - comments, blank lines, banners, and the user/sys time footer are
///   skipped
///
/// Rate annotations are preserved verbatim for display only; derived
/// metrics are always recomputed from the raw counts so the two
/// presentations cannot drift apart.
pub fn parse<'a, I>(lines: I) -> RecordResult<Snapshot>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut events = BTreeMap::new();
    let mut rates = BTreeMap::new();
    let mut not_counted = BTreeSet::new();
    let mut elapsed_seconds = None;

    for raw_line in lines {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || is_boilerplate(line) {
            continue;
        }

        if line.contains("time elapsed") {
            match line.split_whitespace().next().and_then(|t| t.parse::<f64>().ok()) {
                Some(seconds) => elapsed_seconds = Some(seconds),
                None => log::debug!("unreadable elapsed-time line: {:?}", line),
            }
            continue;
        }

        // Everything after '#' is a pre-computed rate hint, display only.
        let (body, annotation) = match line.split_once('#') {
            Some((body, annotation)) => (body.trim(), Some(annotation.trim())),
            None => (line, None),
        };

        if body.starts_with('<') {
            // Sentinel such as "<not counted>" or "<not supported>".
            match sentinel_event_key(body) {
                Some(key) => {
                    not_counted.insert(key.to_string());
                }
                None => log::debug!("skipping malformed sentinel line: {:?}", line),
            }
            continue;
        }

        let mut tokens = body.split_whitespace();
        let count_token = match tokens.next() {
            Some(token) => token,
            None => continue,
        };
        let count = match normalize_count(count_token) {
            Some(count) => count,
            None => {
                log::debug!("skipping malformed counter line: {:?}", line);
                continue;
            }
        };
        let event_key = match tokens.next() {
            Some(key) => key,
            None => {
                log::debug!("skipping counter line without event name: {:?}", line);
                continue;
            }
        };

        events.insert(event_key.to_string(), count);
        if let Some(rate) = annotation {
            if !rate.is_empty() {
                rates.insert(event_key.to_string(), rate.to_string());
            }
        }
    }

    if events.is_empty() && not_counted.is_empty() && elapsed_seconds.is_none() {
        return Err(RecordError::EmptyInput);
    }

    Ok(Snapshot::new(events, rates, not_counted, elapsed_seconds))
}

/// Header banners and timing footers the collection tool emits around
/// the counter table.
fn is_boilerplate(line: &str) -> bool {
    line.contains("Performance counter stats")
        || line.contains("time user")
        || line.contains("time sys")
        || line.contains("seconds user")
        || line.contains("seconds sys")
}

/// Extract the event key from a sentinel line like
/// `<not counted>   some_event`.
fn sentinel_event_key(body: &str) -> Option<&str> {
    let rest = &body[body.find('>')? + 1..];
    rest.split_whitespace().next()
}

/// Normalize a grouped count token ("35,116,397,372") to an integer.
fn normalize_count(token: &str) -> Option<u64> {
    let cleaned: String = token.chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::catalog::keys;

    const RECORD: &str = "\
# started on Thu Aug 28 2026

 Performance counter stats for './stream':

    35,116,397,372      cycles                    #    3.456 GHz
     6,141,273,975      instructions              #    0.17  insn per cycle
       920,707,358      L1-dcache-loads
       976,632,847      L1-dcache-load-misses     #  106.07% of all L1-dcache accesses
   <not supported>      l2_rqsts.references
     <not counted>      fp_arith_inst_retired.512b_packed_single
            390.98 msec task-clock
this line is noise and should be skipped
       0.391234567 seconds time elapsed
       0.380000000 seconds user
       0.010000000 seconds sys
";

    #[test]
    fn parses_grouped_counts() {
        let snapshot = parse(RECORD.lines()).unwrap();
        assert_eq!(snapshot.count(keys::CYCLES), Some(35_116_397_372));
        assert_eq!(snapshot.count(keys::INSTRUCTIONS), Some(6_141_273_975));
        assert_eq!(snapshot.count(keys::L1D_LOAD_MISSES), Some(976_632_847));
    }

    #[test]
    fn sentinel_is_unavailable_not_zero() {
        let snapshot = parse(RECORD.lines()).unwrap();
        assert_eq!(snapshot.count(keys::L2_REFERENCES), None);
        assert!(snapshot.is_not_counted(keys::L2_REFERENCES));
        assert!(snapshot.is_not_counted(keys::FP_512_SINGLE));
    }

    #[test]
    fn elapsed_time_is_captured_and_excluded_from_events() {
        let snapshot = parse(RECORD.lines()).unwrap();
        let elapsed = snapshot.elapsed_seconds().unwrap();
        assert!((elapsed - 0.391234567).abs() < 1e-12);
        assert_eq!(snapshot.count("seconds"), None);
        assert_eq!(snapshot.count("0.391234567"), None);
    }

    #[test]
    fn rate_annotation_is_preserved_verbatim() {
        let snapshot = parse(RECORD.lines()).unwrap();
        assert_eq!(
            snapshot.rate(keys::L1D_LOAD_MISSES),
            Some("106.07% of all L1-dcache accesses")
        );
        assert_eq!(snapshot.rate(keys::CYCLES), Some("3.456 GHz"));
        assert_eq!(snapshot.rate(keys::L1D_LOADS), None);
    }

    #[test]
    fn malformed_and_boilerplate_lines_are_skipped() {
        let snapshot = parse(RECORD.lines()).unwrap();
        // "390.98 msec task-clock" is not an integer count
        assert_eq!(snapshot.count("task-clock"), None);
        assert_eq!(snapshot.count("msec"), None);
        assert_eq!(snapshot.count("Performance"), None);
        assert_eq!(snapshot.len(), 4);
    }

    #[test]
    fn parse_is_idempotent() {
        let first = parse(RECORD.lines()).unwrap();
        let second = parse(RECORD.lines()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            parse("# nothing here\n\n".lines()),
            Err(RecordError::EmptyInput)
        ));
        assert!(matches!(parse([].into_iter()), Err(RecordError::EmptyInput)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = parse_file(Path::new("/nonexistent/record.txt"));
        assert!(matches!(result, Err(RecordError::NotFound(_))));
    }
}
