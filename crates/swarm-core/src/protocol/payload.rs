//! Trailing JSON payload extraction.

use serde_json::Value;

/// Parses the text buffered after `[DATA_BOUNDARY]`.
///
/// Returns `None` while the buffer is empty or still incomplete; this is the
/// normal mid-stream state, not an error. Only objects and arrays qualify,
/// and text after the first complete value is ignored.
pub fn parse_payload(buffer: &str) -> Option<Value> {
    let body = strip_code_fence(buffer.trim());
    if !(body.starts_with('{') || body.starts_with('[')) {
        return None;
    }

    match serde_json::Deserializer::from_str(body)
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(value)) => Some(value),
        Some(Err(err)) => {
            tracing::trace!("[Payload] not parseable yet: {}", err);
            None
        }
        None => None,
    }
}

/// Removes a surrounding Markdown code fence (```` ```json ... ``` ````).
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Fence info line still arriving.
    let Some(newline) = rest.find('\n') else {
        return "";
    };
    let body = rest[newline + 1..].trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
