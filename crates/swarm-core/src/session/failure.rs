//! Provider failures recorded on a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a provider-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Quota or rate limit exceeded (HTTP 429).
    RateLimited,
    /// The backend rejected the request (HTTP 400).
    BadRequest,
    /// Backend overloaded or down (HTTP 5xx).
    ServiceUnavailable,
    /// Missing or invalid credentials (HTTP 401/403).
    Unauthorized,
    /// Connection-level failure before any HTTP status.
    Network,
    /// Anything else.
    Unknown,
}

impl FailureKind {
    /// Maps an HTTP status code, if it is one we recognise.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 => Some(FailureKind::RateLimited),
            400 | 404 | 413 | 422 => Some(FailureKind::BadRequest),
            401 | 403 => Some(FailureKind::Unauthorized),
            500 | 502 | 503 | 504 => Some(FailureKind::ServiceUnavailable),
            _ => None,
        }
    }

    /// Matches known failure signatures in an error message.
    ///
    /// ```
    /// use swarm_core::session::FailureKind;
    ///
    /// assert_eq!(FailureKind::from_signature("RESOURCE_EXHAUSTED: quota"), FailureKind::RateLimited);
    /// assert_eq!(FailureKind::from_signature("something odd"), FailureKind::Unknown);
    /// ```
    pub fn from_signature(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|needle| lower.contains(needle));

        if has(&["429", "resource_exhausted", "rate limit", "quota"]) {
            FailureKind::RateLimited
        } else if has(&[
            "401",
            "403",
            "permission_denied",
            "unauthenticated",
            "api key",
            "api_key",
        ]) {
            FailureKind::Unauthorized
        } else if has(&["503", "unavailable", "overloaded", "500", "internal error"]) {
            FailureKind::ServiceUnavailable
        } else if has(&["400", "invalid_argument", "bad request"]) {
            FailureKind::BadRequest
        } else if has(&["connection", "timed out", "timeout", "dns", "network"]) {
            FailureKind::Network
        } else {
            FailureKind::Unknown
        }
    }

    /// Short user-facing headline.
    pub fn headline(self) -> &'static str {
        match self {
            FailureKind::RateLimited => "Rate limit reached. Wait a moment and retry.",
            FailureKind::BadRequest => "The request was rejected by the model service.",
            FailureKind::ServiceUnavailable => "The model service is temporarily unavailable.",
            FailureKind::Unauthorized => "Authorization failed. Check the API key.",
            FailureKind::Network => "Could not reach the model service.",
            FailureKind::Unknown => "The request failed.",
        }
    }

    /// Whether retrying the same request can reasonably succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::RateLimited
                | FailureKind::ServiceUnavailable
                | FailureKind::Network
                | FailureKind::Unknown
        )
    }
}

/// A provider failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classifies a failure from an optional HTTP status and the error text.
    ///
    /// The status wins when it is recognised; otherwise the message is
    /// matched against known signatures.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = status
            .and_then(FailureKind::from_status)
            .unwrap_or_else(|| FailureKind::from_signature(&message));
        Self { kind, message }
    }

    /// Headline plus detail, suitable for display.
    pub fn user_message(&self) -> String {
        if self.message.is_empty() {
            self.kind.headline().to_string()
        } else {
            format!("{} ({})", self.kind.headline(), self.message)
        }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_takes_precedence() {
        let failure = SessionFailure::classify(Some(503), "quota exceeded");
        assert_eq!(failure.kind, FailureKind::ServiceUnavailable);
    }

    #[test]
    fn test_signature_fallback() {
        let cases = [
            ("got status 429 Too Many Requests", FailureKind::RateLimited),
            ("INVALID_ARGUMENT: bad schema", FailureKind::BadRequest),
            ("The model is overloaded", FailureKind::ServiceUnavailable),
            ("API key not valid", FailureKind::Unauthorized),
            ("PERMISSION_DENIED", FailureKind::Unauthorized),
            ("error sending request: connection refused", FailureKind::Network),
            ("¯\\_(ツ)_/¯", FailureKind::Unknown),
        ];
        for (message, expected) in cases {
            assert_eq!(SessionFailure::classify(None, message).kind, expected, "{message}");
        }
        // Unrecognised status falls back to the message.
        assert_eq!(
            SessionFailure::classify(Some(418), "RESOURCE_EXHAUSTED").kind,
            FailureKind::RateLimited
        );
    }

    #[test]
    fn test_user_message() {
        let failure = SessionFailure::new(FailureKind::Unauthorized, "");
        assert_eq!(failure.user_message(), "Authorization failed. Check the API key.");

        let failure = SessionFailure::new(FailureKind::RateLimited, "429");
        assert!(failure.user_message().ends_with("(429)"));
        assert!(failure.kind.is_retryable());
        assert!(!FailureKind::BadRequest.is_retryable());
    }
}
