//! Task mutations.
//!
//! The backend changes the task list through function calls in one of two
//! shapes. Both are kept as named variants of `TaskMutation`:
//!
//! - bulk (`updateTasks`): the full list, installed as-is
//! - per-task (`manageTask`): one create/update/delete

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{TaskSpec, TaskStatus};
use crate::error::{Result, SwarmError};

/// Function name of the bulk form.
pub const BULK_FUNCTION: &str = "updateTasks";
/// Function name of the per-task form.
pub const PER_TASK_FUNCTION: &str = "manageTask";

/// One instruction to change a session's task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum TaskMutation {
    /// Replace the whole list atomically.
    Bulk { tasks: Vec<TaskSpec> },
    /// Apply a single incremental change.
    PerTask { action: TaskAction },
}

/// An incremental change to one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TaskAction {
    Create {
        task_id: String,
        description: String,
        status: TaskStatus,
    },
    Update {
        task_id: String,
        description: Option<String>,
        status: Option<TaskStatus>,
    },
    Delete {
        task_id: String,
    },
}

impl TaskAction {
    pub fn task_id(&self) -> &str {
        match self {
            TaskAction::Create { task_id, .. }
            | TaskAction::Update { task_id, .. }
            | TaskAction::Delete { task_id } => task_id,
        }
    }
}

impl TaskMutation {
    pub fn bulk(tasks: Vec<TaskSpec>) -> Self {
        TaskMutation::Bulk { tasks }
    }

    pub fn create(
        task_id: impl Into<String>,
        description: impl Into<String>,
        status: TaskStatus,
    ) -> Self {
        TaskMutation::PerTask {
            action: TaskAction::Create {
                task_id: task_id.into(),
                description: description.into(),
                status,
            },
        }
    }

    pub fn update(
        task_id: impl Into<String>,
        description: Option<String>,
        status: Option<TaskStatus>,
    ) -> Self {
        TaskMutation::PerTask {
            action: TaskAction::Update {
                task_id: task_id.into(),
                description,
                status,
            },
        }
    }

    pub fn delete(task_id: impl Into<String>) -> Self {
        TaskMutation::PerTask {
            action: TaskAction::Delete {
                task_id: task_id.into(),
            },
        }
    }

    /// Decodes a function call emitted by the backend.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown function name and `Serialization`
    /// when the arguments do not match the expected shape.
    pub fn from_function_call(name: &str, args: &Value) -> Result<Self> {
        match name {
            BULK_FUNCTION => {
                let args: BulkArgs = serde_json::from_value(args.clone())?;
                Ok(TaskMutation::Bulk { tasks: args.tasks })
            }
            PER_TASK_FUNCTION => {
                let args: PerTaskArgs = serde_json::from_value(args.clone())?;
                Ok(TaskMutation::PerTask {
                    action: args.into_action(),
                })
            }
            other => Err(SwarmError::not_found("TaskFunction", other)),
        }
    }
}

#[derive(Deserialize)]
struct BulkArgs {
    tasks: Vec<TaskSpec>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerTaskArgs {
    action: ActionName,
    #[serde(alias = "id")]
    task_id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<TaskStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ActionName {
    Create,
    Update,
    Delete,
}

impl PerTaskArgs {
    fn into_action(self) -> TaskAction {
        match self.action {
            ActionName::Create => TaskAction::Create {
                task_id: self.task_id,
                description: self.description.unwrap_or_default(),
                status: self.status.unwrap_or_default(),
            },
            ActionName::Update => TaskAction::Update {
                task_id: self.task_id,
                description: self.description,
                status: self.status,
            },
            ActionName::Delete => TaskAction::Delete {
                task_id: self.task_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_bulk_form() {
        let args = json!({
            "tasks": [
                {"id": "t1", "description": "Collect sources", "status": "completed"},
                {"id": "t2", "description": "Draft report", "status": "in_progress"}
            ]
        });
        let mutation = TaskMutation::from_function_call(BULK_FUNCTION, &args).unwrap();
        assert_eq!(
            mutation,
            TaskMutation::bulk(vec![
                TaskSpec::new("t1", "Collect sources", TaskStatus::Completed),
                TaskSpec::new("t2", "Draft report", TaskStatus::InProgress),
            ])
        );
    }

    #[test]
    fn test_decode_per_task_forms() {
        let create = TaskMutation::from_function_call(
            PER_TASK_FUNCTION,
            &json!({"action": "create", "taskId": "t1", "description": "Search"}),
        )
        .unwrap();
        assert_eq!(create, TaskMutation::create("t1", "Search", TaskStatus::Pending));

        let update = TaskMutation::from_function_call(
            PER_TASK_FUNCTION,
            &json!({"action": "update", "taskId": "t1", "status": "completed"}),
        )
        .unwrap();
        assert_eq!(
            update,
            TaskMutation::update("t1", None, Some(TaskStatus::Completed))
        );

        let delete = TaskMutation::from_function_call(
            PER_TASK_FUNCTION,
            &json!({"action": "delete", "taskId": "t1"}),
        )
        .unwrap();
        assert_eq!(delete, TaskMutation::delete("t1"));
    }

    #[test]
    fn test_decode_rejects_unknown_and_malformed() {
        let err = TaskMutation::from_function_call("launchRocket", &json!({})).unwrap_err();
        assert!(err.is_not_found());

        let err = TaskMutation::from_function_call(
            PER_TASK_FUNCTION,
            &json!({"action": "archive", "taskId": "t1"}),
        )
        .unwrap_err();
        assert!(matches!(err, SwarmError::Serialization { .. }));

        assert!(TaskMutation::from_function_call(BULK_FUNCTION, &json!({"tasks": "nope"})).is_err());
    }

    #[test]
    fn test_task_id_accessor() {
        let TaskMutation::PerTask { action } = TaskMutation::delete("t9") else {
            panic!("expected per-task form");
        };
        assert_eq!(action.task_id(), "t9");
    }
}
