//! Stream classifier.
//!
//! Splits the cumulative stream text into report, log lines, layout and the
//! trailing payload. The output is always a function of the full text seen so
//! far; `IncrementalClassifier` only avoids re-reading lines it has already
//! settled.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::markers::{self, DATA_BOUNDARY, LineKind};
use super::payload::parse_payload;
use crate::layout::Layout;

/// Structured view of the cumulative stream text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFragments {
    /// Narrative text with every marker line removed, line breaks preserved.
    pub report: String,
    /// Log entries in arrival order.
    pub log_lines: Vec<String>,
    /// Last layout directive seen; never regresses to `Auto`.
    pub layout: Layout,
    /// Trailing JSON, once `[DATA_BOUNDARY]` and a complete value are present.
    pub structured_payload: Option<Value>,
}

impl ClassifiedFragments {
    /// Folds a complete line, including its `\n`.
    fn push_line(&mut self, line: &str) {
        let body = line.strip_suffix('\n').unwrap_or(line);
        if self.push_marker_line(body) {
            return;
        }
        self.report.push_str(line);
    }

    /// Folds the last line of the buffer, which has no terminator yet.
    ///
    /// While the stream is live a trailing partial marker is withheld; once the
    /// stream has ended the line is complete and nothing is withheld.
    fn push_open_line(&mut self, line: &str, ended: bool) {
        if self.push_marker_line(line) {
            return;
        }
        let visible = match markers::partial_marker_start(line) {
            Some(idx) if !ended => &line[..idx],
            _ => line,
        };
        self.report.push_str(visible);
    }

    /// Folds the text that precedes `[DATA_BOUNDARY]` on the boundary line.
    fn push_boundary_prefix(&mut self, prefix: &str) {
        let prefix = prefix.trim_end();
        if prefix.trim().is_empty() {
            return;
        }
        self.push_line(&format!("{prefix}\n"));
    }

    fn push_marker_line(&mut self, body: &str) -> bool {
        match markers::line_kind(body) {
            LineKind::Log(entry) => {
                if !entry.is_empty() {
                    self.log_lines.push(entry.to_string());
                }
                true
            }
            LineKind::Layout(layout) => {
                self.layout = self.layout.merge(layout);
                true
            }
            LineKind::Report => false,
        }
    }
}

/// Classifies the full cumulative stream text.
///
/// Pure: the same input always yields the same output.
///
/// ```
/// use swarm_core::protocol::classify;
/// use swarm_core::Layout;
///
/// let fragments = classify("[SWARM_LOG] checking index\n[LAYOUT: SPATIAL_SPLIT]\nParis is lovely.\n");
/// assert_eq!(fragments.report, "Paris is lovely.\n");
/// assert_eq!(fragments.log_lines, vec!["checking index"]);
/// assert_eq!(fragments.layout, Layout::SpatialSplit);
/// ```
pub fn classify(raw_text: &str) -> ClassifiedFragments {
    IncrementalClassifier::new().classify(raw_text)
}

/// Classifies the text of a finished stream.
///
/// Same as [`classify`], except the last line counts as complete, so a tail
/// that merely looks like the start of a marker stays in the report.
pub fn classify_final(raw_text: &str) -> ClassifiedFragments {
    IncrementalClassifier::new().finish(raw_text)
}

/// Classifier that remembers the settled part of a growing buffer.
///
/// Complete lines (and everything before `[DATA_BOUNDARY]`, once seen) never
/// change meaning when more text is appended, so they are folded once and
/// cached. Only the open last line and the payload buffer are re-read on each
/// call. A buffer that does not extend the cached prefix triggers a reset.
#[derive(Debug, Clone, Default)]
pub struct IncrementalClassifier {
    consumed: String,
    settled: ClassifiedFragments,
    payload_offset: Option<usize>,
}

impl IncrementalClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `raw_text`, which should extend the text of the previous call.
    pub fn classify(&mut self, raw_text: &str) -> ClassifiedFragments {
        self.fold(raw_text, false)
    }

    /// Classifies the last text of the stream.
    pub fn finish(&mut self, raw_text: &str) -> ClassifiedFragments {
        self.fold(raw_text, true)
    }

    fn fold(&mut self, raw_text: &str, ended: bool) -> ClassifiedFragments {
        if !raw_text.starts_with(self.consumed.as_str()) {
            tracing::debug!(
                "[Classifier] buffer does not extend cached prefix ({} bytes), resetting",
                self.consumed.len()
            );
            *self = Self::default();
        }

        if let Some(offset) = self.payload_offset {
            return self.with_payload(&raw_text[offset..]);
        }

        let pending = &raw_text[self.consumed.len()..];

        if let Some(idx) = pending.find(DATA_BOUNDARY) {
            let head = &pending[..idx];
            let cut = line_cut(head);
            self.settle_lines(&head[..cut]);
            self.settled.push_boundary_prefix(&head[cut..]);

            self.consumed.push_str(&pending[..idx + DATA_BOUNDARY.len()]);
            let offset = self.consumed.len();
            self.payload_offset = Some(offset);
            return self.with_payload(&raw_text[offset..]);
        }

        let cut = line_cut(pending);
        self.settle_lines(&pending[..cut]);
        self.consumed.push_str(&pending[..cut]);

        let mut fragments = self.settled.clone();
        let open_line = &pending[cut..];
        if !open_line.is_empty() {
            fragments.push_open_line(open_line, ended);
        }
        fragments
    }

    /// Number of bytes already folded into the cache.
    pub fn settled_len(&self) -> usize {
        self.consumed.len()
    }

    fn settle_lines(&mut self, complete: &str) {
        for line in complete.split_inclusive('\n') {
            self.settled.push_line(line);
        }
    }

    fn with_payload(&self, buffer: &str) -> ClassifiedFragments {
        let mut fragments = self.settled.clone();
        fragments.structured_payload = parse_payload(buffer);
        fragments
    }
}

/// Byte offset just past the last `\n`, or 0.
fn line_cut(text: &str) -> usize {
    text.rfind('\n').map_or(0, |idx| idx + 1)
}
