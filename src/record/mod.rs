//! Counter records and their parser
//!
//! A record is the text file the collection step leaves behind: one
//! counter per line plus an elapsed-time line. Parsing turns it into
//! an immutable [`Snapshot`]; everything downstream (derived metrics,
//! insights, comparison) reads snapshots and never writes them.

pub mod parser;
pub mod snapshot;

pub use parser::{parse, parse_file};
pub use snapshot::Snapshot;

use std::fmt;
use std::path::PathBuf;

/// Errors for whole-record parsing.
///
/// Finer-grained problems (a single malformed line, a sentinel-valued
/// counter) are not errors: they degrade into absent events.
#[derive(Debug)]
pub enum RecordError {
    /// The referenced record file does not exist
    NotFound(PathBuf),
    /// The record contained no counters and no elapsed time
    EmptyInput,
    /// Underlying I/O failure while reading the record
    Io(std::io::Error),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::NotFound(path) => {
                write!(f, "record file not found: {}", path.display())
            }
            RecordError::EmptyInput => write!(f, "record contains no counter data"),
            RecordError::Io(e) => write!(f, "I/O error reading record: {}", e),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RecordError {
    fn from(error: std::io::Error) -> Self {
        RecordError::Io(error)
    }
}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;
