//! Task collection partitioned by session id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::Task;
use super::mutation::{TaskAction, TaskMutation};

/// What applying a mutation did.
///
/// None of these are errors: a duplicate create or an unknown target is an
/// expected, silently recovered condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Created,
    /// A task with the same id already exists; nothing changed.
    DuplicateCreate,
    Updated,
    Deleted,
    /// Update or delete for an id that does not exist; nothing changed.
    UnknownTarget,
    /// The bulk form installed `count` tasks.
    Replaced { count: usize },
}

impl MutationOutcome {
    pub fn changed(self) -> bool {
        !matches!(
            self,
            MutationOutcome::DuplicateCreate | MutationOutcome::UnknownTarget
        )
    }
}

/// Holds every session's tasks, in insertion order per session.
///
/// Sessions never share tasks, so each partition is mutated independently.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    by_session: HashMap<String, Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks of one session, in the order they were created.
    pub fn tasks(&self, session_id: &str) -> &[Task] {
        self.by_session
            .get(session_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find(&self, session_id: &str, task_id: &str) -> Option<&Task> {
        self.tasks(session_id).iter().find(|task| task.id == task_id)
    }

    /// Applies one mutation to the partition of `session_id`.
    pub fn apply(&mut self, session_id: &str, mutation: &TaskMutation) -> MutationOutcome {
        match mutation {
            TaskMutation::Bulk { tasks } => {
                let mut installed: Vec<Task> = Vec::with_capacity(tasks.len());
                for spec in tasks {
                    if installed.iter().any(|task| task.id == spec.id) {
                        tracing::debug!(
                            "[TaskStore] session={} bulk list repeats task={}, keeping the first",
                            session_id,
                            spec.id
                        );
                        continue;
                    }
                    installed.push(spec.clone().into_task(session_id));
                }
                let count = installed.len();
                self.by_session.insert(session_id.to_string(), installed);
                tracing::debug!("[TaskStore] session={} replaced with {} tasks", session_id, count);
                MutationOutcome::Replaced { count }
            }
            TaskMutation::PerTask { action } => {
                let outcome = self.apply_action(session_id, action);
                if outcome.changed() {
                    tracing::debug!(
                        "[TaskStore] session={} task={} {:?}",
                        session_id,
                        action.task_id(),
                        outcome
                    );
                } else {
                    tracing::debug!(
                        "[TaskStore] session={} task={} mutation ignored: {:?}",
                        session_id,
                        action.task_id(),
                        outcome
                    );
                }
                outcome
            }
        }
    }

    fn apply_action(&mut self, session_id: &str, action: &TaskAction) -> MutationOutcome {
        match action {
            TaskAction::Create {
                task_id,
                description,
                status,
            } => {
                let tasks = self.by_session.entry(session_id.to_string()).or_default();
                if tasks.iter().any(|task| &task.id == task_id) {
                    return MutationOutcome::DuplicateCreate;
                }
                tasks.push(Task {
                    id: task_id.clone(),
                    description: description.clone(),
                    status: *status,
                    session_id: session_id.to_string(),
                });
                MutationOutcome::Created
            }
            TaskAction::Update {
                task_id,
                description,
                status,
            } => {
                let Some(task) = self
                    .by_session
                    .get_mut(session_id)
                    .and_then(|tasks| tasks.iter_mut().find(|task| &task.id == task_id))
                else {
                    return MutationOutcome::UnknownTarget;
                };
                if let Some(description) = description {
                    task.description = description.clone();
                }
                if let Some(status) = status {
                    task.status = *status;
                }
                MutationOutcome::Updated
            }
            TaskAction::Delete { task_id } => {
                let Some(tasks) = self.by_session.get_mut(session_id) else {
                    return MutationOutcome::UnknownTarget;
                };
                let before = tasks.len();
                tasks.retain(|task| &task.id != task_id);
                if tasks.len() == before {
                    MutationOutcome::UnknownTarget
                } else {
                    MutationOutcome::Deleted
                }
            }
        }
    }

    /// Drops a session's partition, returning its tasks.
    pub fn remove_session(&mut self, session_id: &str) -> Vec<Task> {
        self.by_session.remove(session_id).unwrap_or_default()
    }
}
