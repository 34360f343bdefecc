//! Streamed-text protocol.
//!
//! The backend streams plain text that embeds inline markers:
//!
//! - `[SWARM_LOG]` turns its line into a diagnostic log entry
//! - `[LAYOUT: NAME]` announces a layout directive
//! - `[DATA_BOUNDARY]` starts the trailing JSON payload
//!
//! Everything else is narrative report text. Markers are case-sensitive and
//! may appear anywhere in a line.
//!
//! # Module Structure
//!
//! - `markers`: marker vocabulary and line-level matching
//! - `payload`: trailing JSON extraction
//! - `classifier`: `classify` and the caching `IncrementalClassifier`

mod classifier;
pub mod markers;
mod payload;

pub use classifier::{ClassifiedFragments, IncrementalClassifier, classify, classify_final};
pub use payload::parse_payload;
