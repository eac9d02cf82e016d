//! Counter event identity and classification
//!
//! Hardware counters are identified by the stable string keys the
//! collection tool reports them under. The catalog maps those keys to
//! a display category and a human-readable label; everything else in
//! the crate treats counter keys as opaque strings.

pub mod catalog;

pub use catalog::{classify, EventCategory};
