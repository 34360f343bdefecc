//! Task domain module.
//!
//! This module contains the mission task list the backend maintains for each
//! session through out-of-band function calls.
//!
//! # Module Structure
//!
//! - `model`: Core task domain models (`Task`, `TaskStatus`, `TaskSpec`)
//! - `mutation`: The two mutation forms (`TaskMutation::Bulk`, `TaskMutation::PerTask`)
//!   and their function-call decoding
//! - `store`: `TaskStore`, the task collection partitioned by session id
//!
//! # Usage
//!
//! ```ignore
//! use swarm_core::task::{Task, TaskStatus, TaskMutation, TaskAction, TaskStore};
//! ```

mod model;
mod mutation;
mod store;

// Re-export public API
pub use model::{Task, TaskSpec, TaskStatus};
pub use mutation::{BULK_FUNCTION, PER_TASK_FUNCTION, TaskAction, TaskMutation};
pub use store::{MutationOutcome, TaskStore};
