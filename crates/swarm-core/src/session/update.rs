use serde::{Deserialize, Serialize};

use crate::reference::Reference;
use crate::task::TaskMutation;

/// One emission from the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamUpdate {
    /// Full text received so far; grows monotonically.
    pub raw_text: String,
    /// Task mutations to apply, in order.
    #[serde(default)]
    pub task_mutations: Vec<TaskMutation>,
    /// The complete current reference set.
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub is_final: bool,
}

impl StreamUpdate {
    pub fn text(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    pub fn with_mutations(mut self, mutations: Vec<TaskMutation>) -> Self {
        self.task_mutations = mutations;
        self
    }

    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.references = references;
        self
    }

    pub fn finalized(mut self) -> Self {
        self.is_final = true;
        self
    }
}
