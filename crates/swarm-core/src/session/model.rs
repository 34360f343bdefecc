//! Session domain model.
//!
//! This module contains the core Session entity that represents one query's
//! lifecycle, from submission to completion or failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::failure::SessionFailure;
use crate::layout::Layout;
use crate::reference::Reference;
use crate::task::Task;

/// Lifecycle state of a session.
///
/// `Initializing -> Streaming -> {Completed, Failed}`; the last two are
/// terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Initializing,
    Streaming,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// Represents one submitted query in the application's domain layer.
///
/// A session contains:
/// - The query text
/// - The projected stream state (report, log lines, layout, payload)
/// - The latest grounding references
/// - Lifecycle status and, once failed, the failure
/// - Timestamps for creation and last update
///
/// Sessions are only mutated through `SessionStore`; everything else reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    pub query: String,
    /// Narrative report text
    pub report: String,
    pub log_lines: Vec<String>,
    pub layout: Layout,
    pub references: Vec<Reference>,
    /// Trailing JSON payload; sticky once set
    pub structured_payload: Option<Value>,
    pub status: SessionStatus,
    /// Set when the session failed
    pub failure: Option<SessionFailure>,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
}

impl Session {
    /// Creates a fresh session in `Initializing` state with a new UUID.
    pub fn new(query: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            created_at: now.clone(),
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Read model handed to renderers: a session plus its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub tasks: Vec<Task>,
}
