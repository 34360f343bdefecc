//! Query request and its configuration.

use serde::{Deserialize, Serialize};

/// Which model tier to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    /// Fast, cheaper model.
    #[default]
    Flash,
    /// Slower, deeper reasoning.
    Pro,
}

impl ModelChoice {
    pub fn model_id(self) -> &'static str {
        match self {
            ModelChoice::Flash => "gemini-2.5-flash",
            ModelChoice::Pro => "gemini-2.5-pro",
        }
    }
}

/// A geographic point used to bias maps grounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// A file sent inline with the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Speaker of a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Model,
}

/// A prior turn replayed to the backend as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

/// Everything the provider needs besides the query text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub model: ModelChoice,
    /// Free-form persona the backend should adopt.
    #[serde(default)]
    pub persona: Option<String>,
    /// Enable maps grounding.
    #[serde(default)]
    pub use_maps: bool,
    #[serde(default)]
    pub location: Option<GeoLocation>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

/// A submitted query. Kept with the session so a retry can re-submit it
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub config: QueryConfig,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            config: QueryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }
}
