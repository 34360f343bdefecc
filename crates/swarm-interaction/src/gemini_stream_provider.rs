//! GeminiStreamProvider - streaming REST implementation for Gemini.
//!
//! Calls `streamGenerateContent` with server-sent events and folds every
//! event into a cumulative `StreamUpdate`. Credentials come from the
//! environment or secret.json.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::time::Duration;
use swarm_core::protocol::markers::{DATA_BOUNDARY, LOG_MARKER};
use swarm_core::session::{
    Attachment, FailureKind, QueryRequest, SessionFailure, StreamUpdate, TurnRole,
};
use swarm_core::task::{BULK_FUNCTION, PER_TASK_FUNCTION, TaskMutation};
use swarm_core::{Layout, SwarmError};

use crate::config::resolve_gemini_config;
use crate::grounding::ReferenceCollector;
use crate::provider::{StreamProvider, UpdateStream};
use crate::sse::SseDecoder;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Provider that streams from the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiStreamProvider {
    client: Client,
    api_key: String,
    /// Fixed model; when unset the query's `ModelChoice` decides.
    model: Option<String>,
    base_url: String,
}

impl GeminiStreamProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: None,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Loads credentials from `GEMINI_API_KEY` or secret.json.
    pub fn try_from_env() -> Result<Self, SwarmError> {
        let config = resolve_gemini_config()?;
        let provider = Self::new(config.api_key);
        Ok(match config.model_name {
            Some(model) => provider.with_model(model),
            None => provider,
        })
    }

    /// Pins the model regardless of the query's model choice.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn model_for(&self, request: &QueryRequest) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| request.config.model.model_id().to_string())
    }
}

#[async_trait]
impl StreamProvider for GeminiStreamProvider {
    async fn open(&self, request: &QueryRequest) -> Result<UpdateStream, SessionFailure> {
        let model = self.model_for(request);
        let url = stream_url(&self.base_url, &model);
        let body = build_request(request);

        tracing::info!(
            "[GeminiStreamProvider] opening stream model={} maps={} history={}",
            model,
            request.config.use_maps,
            request.config.history.len()
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_failure)?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(request_failure)
            })
            .boxed();
        Ok(decode_updates(bytes))
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Serialize)]
struct StreamGenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    tools: Vec<Tool>,
    #[serde(rename = "toolConfig", skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    google_search: Option<EmptyConfig>,
    #[serde(rename = "googleMaps", skip_serializing_if = "Option::is_none")]
    google_maps: Option<EmptyConfig>,
    #[serde(rename = "functionDeclarations", skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Value>,
}

#[derive(Serialize, Default)]
struct EmptyConfig {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    retrieval_config: RetrievalConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfig {
    lat_lng: LatLng,
}

#[derive(Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

fn build_request(request: &QueryRequest) -> StreamGenerateRequest {
    let config = &request.config;

    let mut contents: Vec<Content> = config
        .history
        .iter()
        .map(|turn| Content {
            role: match turn.role {
                TurnRole::User => "user",
                TurnRole::Model => "model",
            }
            .to_string(),
            parts: vec![Part::Text {
                text: turn.text.clone(),
            }],
        })
        .collect();

    let mut parts = vec![Part::Text {
        text: request.query.clone(),
    }];
    if let Some(attachment) = &config.attachment {
        parts.push(attachment_to_part(attachment));
    }
    contents.push(Content {
        role: "user".to_string(),
        parts,
    });

    let mut tools = vec![Tool {
        google_search: Some(EmptyConfig {}),
        ..Tool::default()
    }];
    if config.use_maps {
        tools.push(Tool {
            google_maps: Some(EmptyConfig {}),
            ..Tool::default()
        });
    }
    tools.push(Tool {
        function_declarations: Some(task_function_declarations()),
        ..Tool::default()
    });

    let tool_config = config
        .location
        .filter(|_| config.use_maps)
        .map(|location| ToolConfig {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude: location.latitude,
                    longitude: location.longitude,
                },
            },
        });

    StreamGenerateRequest {
        contents,
        system_instruction: Content {
            role: "system".to_string(),
            parts: vec![Part::Text {
                text: system_instruction(config.persona.as_deref()),
            }],
        },
        tools,
        tool_config,
    }
}

fn attachment_to_part(attachment: &Attachment) -> Part {
    Part::InlineData {
        inline_data: InlineDataPayload {
            mime_type: attachment.mime_type.clone(),
            data: BASE64_STANDARD.encode(&attachment.data),
        },
    }
}

fn system_instruction(persona: Option<&str>) -> String {
    let layouts = Layout::ALL
        .iter()
        .map(|layout| layout.marker())
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!(
        "You coordinate a swarm of research agents and stream a Markdown report to the user.\n\
         Follow this output protocol exactly:\n\
         - Every line that narrates agent activity starts with {LOG_MARKER}. These lines go to the activity log, not the report.\n\
         - To suggest how the report should be displayed, write one of {layouts} on its own line.\n\
         - If structured data helps (tables, charts, places), finish the report, write {DATA_BOUNDARY} on its own line, then a single JSON object or array and nothing else.\n\
         - Keep the mission plan current with the {BULK_FUNCTION} or {PER_TASK_FUNCTION} functions."
    );
    if let Some(persona) = persona.map(str::trim).filter(|p| !p.is_empty()) {
        text.push_str("\n\nAdopt this persona throughout: ");
        text.push_str(persona);
    }
    text
}

fn task_function_declarations() -> Value {
    let status = json!({
        "type": "STRING",
        "enum": ["pending", "in_progress", "completed"]
    });

    json!([
        {
            "name": BULK_FUNCTION,
            "description": "Replace the whole mission task list.",
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "tasks": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "id": {"type": "STRING"},
                                "description": {"type": "STRING"},
                                "status": status
                            },
                            "required": ["id", "description", "status"]
                        }
                    }
                },
                "required": ["tasks"]
            }
        },
        {
            "name": PER_TASK_FUNCTION,
            "description": "Create, update or delete a single mission task.",
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "action": {"type": "STRING", "enum": ["create", "update", "delete"]},
                    "taskId": {"type": "STRING"},
                    "description": {"type": "STRING"},
                    "status": status
                },
                "required": ["action", "taskId"]
            }
        }
    ])
}

// ============================================================================
// Response
// ============================================================================

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

impl ErrorBody {
    fn describe(&self, fallback: &str) -> String {
        let status_text = self.status.clone().unwrap_or_default();
        let msg = self
            .message
            .clone()
            .unwrap_or_else(|| fallback.to_string());
        if status_text.is_empty() {
            msg
        } else {
            format!("{status_text}: {msg}")
        }
    }
}

/// Folds response chunks into cumulative updates.
#[derive(Debug, Default)]
struct ResponseAccumulator {
    text: String,
    references: ReferenceCollector,
}

impl ResponseAccumulator {
    /// Ingests one event payload. Returns `None` when the event changed
    /// nothing.
    fn ingest(&mut self, payload: &str) -> Result<Option<StreamUpdate>, SessionFailure> {
        let chunk: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("[GeminiStreamProvider] skipping undecodable event: {}", err);
                return Ok(None);
            }
        };

        if let Some(error) = chunk.get("error") {
            let body: ErrorBody = serde_json::from_value(error.clone()).map_err(|_| {
                SessionFailure::classify(None, format!("Gemini stream error: {error}"))
            })?;
            return Err(SessionFailure::classify(body.code, body.describe(payload)));
        }

        if let Some(reason) = chunk
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            return Err(SessionFailure::new(
                FailureKind::BadRequest,
                format!("Prompt blocked: {reason}"),
            ));
        }

        let mut text_changed = false;
        let mut mutations = Vec::new();
        let parts = chunk
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for part in parts {
            if part.get("thought").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                text_changed |= !text.is_empty();
                self.text.push_str(text);
            }
            if let Some(call) = part.get("functionCall") {
                let name = call.get("name").and_then(Value::as_str).unwrap_or_default();
                let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
                match TaskMutation::from_function_call(name, &args) {
                    Ok(mutation) => mutations.push(mutation),
                    Err(err) => {
                        tracing::warn!("[GeminiStreamProvider] ignoring function call {}: {}", name, err)
                    }
                }
            }
        }

        let references_changed = self.references.collect(&chunk);

        if !text_changed && !references_changed && mutations.is_empty() {
            return Ok(None);
        }

        Ok(Some(StreamUpdate {
            raw_text: self.text.clone(),
            task_mutations: mutations,
            references: self.references.references().to_vec(),
            is_final: false,
        }))
    }

    fn finish(&self) -> StreamUpdate {
        StreamUpdate::text(self.text.clone())
            .with_references(self.references.references().to_vec())
            .finalized()
    }
}

type ByteStream = BoxStream<'static, Result<Vec<u8>, SessionFailure>>;

struct DecodeState {
    body: ByteStream,
    decoder: SseDecoder,
    accumulator: ResponseAccumulator,
    pending: VecDeque<Result<StreamUpdate, SessionFailure>>,
    done: bool,
}

impl DecodeState {
    fn ingest(&mut self, events: impl IntoIterator<Item = String>) {
        for event in events {
            if self.done {
                return;
            }
            match self.accumulator.ingest(&event) {
                Ok(Some(update)) => self.pending.push_back(Ok(update)),
                Ok(None) => {}
                Err(failure) => {
                    tracing::warn!("[GeminiStreamProvider] stream failed: {}", failure);
                    self.pending.push_back(Err(failure));
                    self.done = true;
                }
            }
        }
    }
}

/// Turns an SSE body into updates, ending with a final update or the
/// first failure.
fn decode_updates(body: ByteStream) -> UpdateStream {
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        accumulator: ResponseAccumulator::default(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(&bytes);
                    state.ingest(events);
                }
                Some(Err(failure)) => {
                    state.pending.push_back(Err(failure));
                    state.done = true;
                }
                None => {
                    let tail = state.decoder.finish();
                    state.ingest(tail);
                    if !state.done {
                        tracing::debug!(
                            "[GeminiStreamProvider] stream finished, {} chars",
                            state.accumulator.text.len()
                        );
                        state.pending.push_back(Ok(state.accumulator.finish()));
                        state.done = true;
                    }
                }
            }
        }
    })
    .boxed()
}

fn stream_url(base_url: &str, model: &str) -> String {
    format!("{base_url}/{model}:streamGenerateContent?alt=sse")
}

/// Failure for a transport error. The URL is stripped from the message.
fn request_failure(err: reqwest::Error) -> SessionFailure {
    let err = err.without_url();
    let message = format!("Gemini API request failed: {err}");
    if err.is_connect() || err.is_timeout() {
        SessionFailure::new(FailureKind::Network, message)
    } else {
        SessionFailure::classify(err.status().map(|status| status.as_u16()), message)
    }
}

fn map_http_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> SessionFailure {
    let mut message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| wrapper.error.describe(&body))
        .unwrap_or_else(|_| body.clone());

    if let Some(delay) = retry_after {
        message.push_str(&format!(" (retry after {}s)", delay.as_secs()));
    }

    SessionFailure::classify(Some(status.as_u16()), message)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.parse::<u64>().ok().map(Duration::from_secs)
}
