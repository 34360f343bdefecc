//! Grounding references attached to a streamed answer.

use serde::{Deserialize, Serialize};

/// Where a grounding reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    /// A web page found by search grounding.
    Web,
    /// A place returned by maps grounding.
    Map,
}

/// A citation supporting the report.
///
/// The provider always delivers the complete current set, so sessions replace
/// their references wholesale on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub uri: String,
    pub title: String,
    pub kind: ReferenceKind,
}

impl Reference {
    pub fn web(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            kind: ReferenceKind::Web,
        }
    }

    pub fn map(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            kind: ReferenceKind::Map,
        }
    }
}
