//! Task domain model.
//!
//! This module contains the core Task entities that represent the mission
//! task list shown alongside a streaming report.

use serde::{Deserialize, Serialize};

/// Represents the current status of a mission task.
///
/// The backend spells these in several ways, so deserialization accepts the
/// upper-case and hyphenated forms as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Announced but not started.
    #[default]
    #[serde(alias = "PENDING")]
    Pending,
    /// Being worked on.
    #[serde(alias = "IN_PROGRESS", alias = "in-progress", alias = "inProgress")]
    InProgress,
    /// Finished.
    #[serde(alias = "COMPLETED", alias = "done")]
    Completed,
}

/// A task owned by exactly one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique within the owning session.
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    /// The owning session. Tasks never move between sessions.
    pub session_id: String,
}

/// A task entry as delivered by the bulk form, before it is stamped with a
/// session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>, description: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status,
        }
    }

    /// Stamps the entry with its owning session.
    pub fn into_task(self, session_id: &str) -> Task {
        Task {
            id: self.id,
            description: self.description,
            status: self.status,
            session_id: session_id.to_string(),
        }
    }
}
