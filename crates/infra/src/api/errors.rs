//! API-specific error types
//!
//! [`ApiError`] is the closed set of failures an API operation can raise.
//! Error response bodies are parsed once, at the transport boundary, into
//! [`ErrorBody`], so call sites never inspect raw JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smsdesk_common::error::{ErrorClassification, ErrorSeverity};
use smsdesk_domain::SmsDeskError;
use thiserror::Error;

use super::taxonomy::{self, Tone};
use crate::http::TransportError;

const SUMMARY_MAX_CHARS: usize = 200;

/// Structured error body: `{ error, message?, details?, install_url? }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    /// Symbolic application code (e.g. `invalid_phone`)
    #[serde(default)]
    pub error: Option<String>,
    /// Server-side explanation, never shown to users as is
    #[serde(default)]
    pub message: Option<String>,
    /// Free-form context such as the offending field
    #[serde(default)]
    pub details: Option<Value>,
    /// Present on 409 when the app must be (re)installed
    #[serde(default)]
    pub install_url: Option<String>,
}

/// Body of a non-2xx response
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// JSON object in the documented error shape
    Structured(StructuredError),
    /// Anything else, kept verbatim
    Unstructured(String),
}

impl Default for ErrorBody {
    fn default() -> Self {
        Self::Unstructured(String::new())
    }
}

impl ErrorBody {
    /// Parse a raw response body.
    ///
    /// A JSON object with the expected field types is `Structured`; anything
    /// else (HTML, plain text, arrays, malformed JSON) is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => match serde_json::from_value(value) {
                Ok(structured) => Self::Structured(structured),
                Err(_) => Self::Unstructured(raw.to_string()),
            },
            _ => Self::Unstructured(raw.to_string()),
        }
    }

    /// Structured form, when the body had one
    pub fn structured(&self) -> Option<&StructuredError> {
        match self {
            Self::Structured(body) => Some(body),
            Self::Unstructured(_) => None,
        }
    }

    /// Symbolic application code, if the body carried one
    pub fn code(&self) -> Option<&str> {
        self.structured().and_then(|body| body.error.as_deref())
    }

    /// Server-supplied message
    pub fn message(&self) -> Option<&str> {
        self.structured().and_then(|body| body.message.as_deref())
    }

    /// Install URL carried by the body
    pub fn install_url(&self) -> Option<&str> {
        self.structured().and_then(|body| body.install_url.as_deref())
    }

    /// Short, single-line description for error messages and logs
    pub fn summary(&self) -> String {
        match self {
            Self::Structured(body) => body
                .message
                .clone()
                .or_else(|| body.error.clone())
                .unwrap_or_else(|| "structured error".to_string()),
            Self::Unstructured(text) if text.trim().is_empty() => "<empty body>".to_string(),
            Self::Unstructured(text) => {
                let line = text.trim().replace(['\r', '\n'], " ");
                if line.chars().count() > SUMMARY_MAX_CHARS {
                    let truncated: String = line.chars().take(SUMMARY_MAX_CHARS).collect();
                    format!("{truncated}...")
                } else {
                    line
                }
            }
        }
    }
}

/// API operation errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The credential provider could not supply a token; never retried
    #[error("Credential provider failed: {0}")]
    Credential(String),

    /// HTTP 429; `retry_after` is the delay that was (or would be) waited
    #[error("Rate limit exceeded (retry after {retry_after:?}): {}", .body.summary())]
    RateLimited { retry_after: Duration, body: ErrorBody },

    /// Any other non-2xx response
    #[error("HTTP {status}: {}", .body.summary())]
    Status { status: u16, body: ErrorBody },

    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The per-attempt timeout elapsed
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// A 2xx body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built (bad path, unserializable body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body for failures that received one
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::RateLimited { body, .. } | Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Symbolic application code from a structured error body
    pub fn app_code(&self) -> Option<&str> {
        self.body().and_then(ErrorBody::code)
    }

    /// Install URL of an app-not-installed (409) response
    pub fn install_redirect(&self) -> Option<&str> {
        match self {
            Self::Status { status: 409, body } => body.install_url(),
            _ => None,
        }
    }

    /// Taxonomy entry describing this failure
    pub fn taxonomy_entry(&self) -> &'static taxonomy::TaxonomyEntry {
        taxonomy::classify_error(self)
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Credential(_) | Self::Decode(_) | Self::InvalidRequest(_) | Self::Config(_) => {
                false
            }
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self.taxonomy_entry().tone {
            Tone::Critical => ErrorSeverity::Critical,
            Tone::Warning => ErrorSeverity::Warning,
            Tone::Info | Tone::Success => ErrorSeverity::Info,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ if self.is_retryable() => self.taxonomy_entry().retry_delay,
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => Self::Timeout(after),
            TransportError::Connect(message) | TransportError::Request(message) => {
                Self::Network(message)
            }
            TransportError::Build(message) => Self::InvalidRequest(message),
        }
    }
}

impl From<SmsDeskError> for ApiError {
    fn from(err: SmsDeskError) -> Self {
        match err {
            SmsDeskError::Config(message) => Self::Config(message),
            SmsDeskError::Network(message) => Self::Network(message),
            SmsDeskError::Auth(message) => Self::Credential(message),
            SmsDeskError::InvalidInput(message) => Self::InvalidRequest(message),
            SmsDeskError::Internal(message) => Self::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_structured_body() {
        let body = ErrorBody::parse(r#"{"error":"invalid_phone","message":"bad number"}"#);
        assert_eq!(body.code(), Some("invalid_phone"));
        assert_eq!(body.message(), Some("bad number"));
        assert_eq!(body.summary(), "bad number");
    }

    #[test]
    fn install_url_only_body_is_structured() {
        let body = ErrorBody::parse(r#"{"install_url":"https://x/install"}"#);
        assert_eq!(body.install_url(), Some("https://x/install"));
        assert_eq!(body.code(), None);
    }

    #[test]
    fn non_object_bodies_are_unstructured() {
        for raw in ["<html>Bad Gateway</html>", "[1,2]", "\"text\"", "{broken", ""] {
            assert!(matches!(ErrorBody::parse(raw), ErrorBody::Unstructured(_)), "{raw}");
        }
        assert_eq!(ErrorBody::parse("").summary(), "<empty body>");
    }

    #[test]
    fn mistyped_fields_fall_back_to_unstructured() {
        let body = ErrorBody::parse(r#"{"error": 42}"#);
        assert_eq!(body, ErrorBody::Unstructured(r#"{"error": 42}"#.to_string()));
    }

    #[test]
    fn long_unstructured_summary_is_truncated() {
        let body = ErrorBody::Unstructured("x".repeat(500));
        assert_eq!(body.summary().len(), SUMMARY_MAX_CHARS + 3);
    }

    #[test]
    fn retryability_follows_failure_kind() {
        let status = |code| ApiError::Status { status: code, body: ErrorBody::default() };

        assert!(status(500).is_retryable());
        assert!(status(504).is_retryable());
        assert!(!status(422).is_retryable());
        assert!(ApiError::Network("refused".into()).is_retryable());
        assert!(ApiError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!ApiError::Credential("no session".into()).is_retryable());

        let limited = ApiError::RateLimited {
            retry_after: Duration::from_secs(2),
            body: ErrorBody::default(),
        };
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(limited.status(), Some(429));
    }

    #[test]
    fn install_redirect_requires_409() {
        let body = ErrorBody::Structured(StructuredError {
            install_url: Some("https://x/install".into()),
            ..Default::default()
        });
        let conflict = ApiError::Status { status: 409, body: body.clone() };
        let other = ApiError::Status { status: 400, body };

        assert_eq!(conflict.install_redirect(), Some("https://x/install"));
        assert_eq!(other.install_redirect(), None);
    }

    #[test]
    fn severity_comes_from_taxonomy_tone() {
        let unauthorized = ApiError::Status { status: 401, body: ErrorBody::default() };
        assert_eq!(unauthorized.severity(), ErrorSeverity::Critical);

        let invalid = ApiError::Status {
            status: 422,
            body: ErrorBody::parse(&json!({"error": "invalid_phone"}).to_string()),
        };
        assert_eq!(invalid.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn transport_errors_convert() {
        assert!(matches!(
            ApiError::from(TransportError::Timeout(Duration::from_secs(3))),
            ApiError::Timeout(d) if d == Duration::from_secs(3)
        ));
        assert!(matches!(
            ApiError::from(TransportError::Connect("refused".into())),
            ApiError::Network(_)
        ));
    }
}
