//! Marker vocabulary and line-level matching.

use std::str::FromStr;

use crate::layout::Layout;

pub const LOG_MARKER: &str = "[SWARM_LOG]";
pub const DATA_BOUNDARY: &str = "[DATA_BOUNDARY]";
pub const LAYOUT_OPEN: &str = "[LAYOUT:";

/// What a single complete line means to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Diagnostic log line; carries the trimmed text after the marker.
    Log(&'a str),
    /// Layout directive line.
    Layout(Layout),
    /// Ordinary narrative text.
    Report,
}

/// Classifies one line (without its line terminator).
///
/// A log marker takes precedence over a layout marker on the same line.
pub fn line_kind(line: &str) -> LineKind<'_> {
    if let Some(idx) = line.find(LOG_MARKER) {
        return LineKind::Log(line[idx + LOG_MARKER.len()..].trim());
    }
    match layout_directive(line) {
        Some(layout) => LineKind::Layout(layout),
        None => LineKind::Report,
    }
}

/// Finds the last well-formed `[LAYOUT: NAME]` directive in a line.
///
/// Unknown names do not count as directives.
pub fn layout_directive(line: &str) -> Option<Layout> {
    let mut found = None;
    let mut rest = line;
    while let Some(start) = rest.find(LAYOUT_OPEN) {
        let after = &rest[start + LAYOUT_OPEN.len()..];
        let Some(close) = after.find(']') else {
            break;
        };
        if let Ok(layout) = Layout::from_str(after[..close].trim()) {
            found = Some(layout);
        }
        rest = &after[close + 1..];
    }
    found
}

/// Byte offset where an incomplete marker starts at the end of `line`.
///
/// Only the last `[` can open a marker that runs to the end of the line.
pub fn partial_marker_start(line: &str) -> Option<usize> {
    let idx = line.rfind('[')?;
    let tail = &line[idx..];
    let pending = fixed_markers()
        .chain(Layout::ALL.iter().flat_map(|layout| {
            [
                layout.marker(),
                format!("{}{}]", LAYOUT_OPEN, layout.as_str()),
            ]
        }))
        .any(|marker| marker.len() > tail.len() && marker.starts_with(tail));
    pending.then_some(idx)
}

fn fixed_markers() -> impl Iterator<Item = String> {
    [LOG_MARKER, DATA_BOUNDARY].into_iter().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_marker_anywhere_in_line() {
        assert_eq!(line_kind("[SWARM_LOG] checking index"), LineKind::Log("checking index"));
        assert_eq!(line_kind("  >> [SWARM_LOG]  fetched 3 sources "), LineKind::Log("fetched 3 sources"));
        assert_eq!(line_kind("[SWARM_LOG]"), LineKind::Log(""));
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        assert_eq!(line_kind("[swarm_log] nope"), LineKind::Report);
        assert_eq!(line_kind("[LAYOUT: spatial_split]"), LineKind::Report);
    }

    #[test]
    fn test_layout_directive_variants() {
        assert_eq!(line_kind("[LAYOUT: SPATIAL_SPLIT]"), LineKind::Layout(Layout::SpatialSplit));
        assert_eq!(line_kind("ok [LAYOUT:DATA_FOCUS] done"), LineKind::Layout(Layout::DataFocus));
        assert_eq!(line_kind("[LAYOUT: AUTO]"), LineKind::Layout(Layout::Auto));
        assert_eq!(
            layout_directive("[LAYOUT: REPORT_ONLY] [LAYOUT: DATA_FOCUS]"),
            Some(Layout::DataFocus)
        );
        assert_eq!(line_kind("[LAYOUT: SIDEWAYS]"), LineKind::Report);
        assert_eq!(line_kind("[LAYOUT: SPATIAL_SPLIT"), LineKind::Report);
    }

    #[test]
    fn test_log_wins_over_layout() {
        assert_eq!(
            line_kind("[SWARM_LOG] switching to [LAYOUT: DATA_FOCUS]"),
            LineKind::Log("switching to [LAYOUT: DATA_FOCUS]")
        );
    }

    #[test]
    fn test_partial_marker_detection() {
        assert_eq!(partial_marker_start("Paris [SWARM_L"), Some(6));
        assert_eq!(partial_marker_start("["), Some(0));
        assert_eq!(partial_marker_start("[DATA_"), Some(0));
        assert_eq!(partial_marker_start("[LAYOUT: SPAT"), Some(0));
        assert_eq!(partial_marker_start("[LAYOUT:DATA"), Some(0));
        assert_eq!(partial_marker_start("see [1]"), None);
        assert_eq!(partial_marker_start("array [x"), None);
        assert_eq!(partial_marker_start("no brackets"), None);
        // A complete marker is not partial.
        assert_eq!(partial_marker_start("[SWARM_LOG]"), None);
    }
}
