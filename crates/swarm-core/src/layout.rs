//! Layout directives emitted by the backend.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How the report view should be arranged.
///
/// The backend announces a layout through an inline `[LAYOUT: NAME]` marker.
/// `Auto` is the default and the least specific value.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Layout {
    /// No directive received yet.
    #[default]
    Auto,
    /// Narrative report only.
    ReportOnly,
    /// Report next to a map.
    SpatialSplit,
    /// Structured data gets the main area.
    DataFocus,
}

impl Layout {
    pub const ALL: [Layout; 4] = [
        Layout::Auto,
        Layout::ReportOnly,
        Layout::SpatialSplit,
        Layout::DataFocus,
    ];

    pub fn is_auto(self) -> bool {
        matches!(self, Layout::Auto)
    }

    /// Sticky merge: a non-`Auto` value always wins, `Auto` never
    /// overwrites something more specific.
    ///
    /// ```
    /// use swarm_core::Layout;
    ///
    /// let current = Layout::SpatialSplit;
    /// assert_eq!(current.merge(Layout::Auto), Layout::SpatialSplit);
    /// assert_eq!(current.merge(Layout::DataFocus), Layout::DataFocus);
    /// ```
    pub fn merge(self, incoming: Layout) -> Layout {
        if incoming.is_auto() { self } else { incoming }
    }

    /// Wire name, e.g. `SPATIAL_SPLIT`.
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// The literal marker the backend emits for this layout.
    pub fn marker(self) -> String {
        format!("[LAYOUT: {}]", self.as_str())
    }
}
