//! Error taxonomy
//!
//! A closed, static table mapping failure signals onto user-presentable
//! entries. [`classify`] is total: every input, including empty or
//! malformed ones, resolves to an entry.
//!
//! Resolution order:
//! 1. a symbolic application code present in the table (`invalid_phone`)
//! 2. the HTTP status, through the status-to-code table
//! 3. a detected network or timeout condition
//! 4. `unknown_error`

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

/// Presentation tone of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Blocks the user until resolved
    Critical,
    /// Recoverable, usually by retrying or fixing input
    Warning,
    /// Informational only
    Info,
    /// Positive confirmation
    Success,
}

/// Static description of one class of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntry {
    /// Symbolic code the entry is keyed by
    pub code: &'static str,
    /// Short heading for banners
    pub title: &'static str,
    /// User-facing explanation, published with `api-error`
    pub message: &'static str,
    /// Label of the single suggested action
    pub action: &'static str,
    /// Presentation tone, also drives log severity
    pub tone: Tone,
    /// Whether the failure is transient
    pub retryable: bool,
    /// Suggested wait before the user tries again
    pub retry_delay: Option<Duration>,
    /// Documentation link for the failure
    pub help_url: Option<&'static str>,
}

/// Fallback code when nothing else matches
pub const UNKNOWN_ERROR: &str = "unknown_error";
/// No response was received
pub const NETWORK_ERROR: &str = "network_error";
/// An attempt exceeded its timeout
pub const TIMEOUT_ERROR: &str = "timeout_error";
/// The credential provider could not supply a token
pub const AUTH_REQUIRED: &str = "auth_required";

/// HTTP status to symbolic code
const STATUS_CODES: &[(u16, &str)] = &[
    (400, "shop_required"),
    (401, "401"),
    (403, "403"),
    (404, "404"),
    (409, "409"),
    (422, "422"),
    (429, "429"),
    (500, "500"),
    (502, "502"),
    (503, "503"),
];

const fn entry(
    code: &'static str,
    title: &'static str,
    message: &'static str,
    action: &'static str,
    tone: Tone,
) -> TaxonomyEntry {
    TaxonomyEntry {
        code,
        title,
        message,
        action,
        tone,
        retryable: false,
        retry_delay: None,
        help_url: None,
    }
}

const fn retryable(mut entry: TaxonomyEntry, delay: Duration) -> TaxonomyEntry {
    entry.retryable = true;
    entry.retry_delay = Some(delay);
    entry
}

const fn with_help(mut entry: TaxonomyEntry, url: &'static str) -> TaxonomyEntry {
    entry.help_url = Some(url);
    entry
}

static ENTRIES: &[TaxonomyEntry] = &[
    // Status-derived codes
    with_help(
        entry(
            "shop_required",
            "Store not identified",
            "We couldn't tell which store this request is for. Open the app from your store admin and try again.",
            "Reload app",
            Tone::Critical,
        ),
        "https://help.smsdesk.app/getting-started",
    ),
    entry(
        "401",
        "Session expired",
        "Your session has expired. Please re-authenticate to continue.",
        "Re-authenticate",
        Tone::Critical,
    ),
    with_help(
        entry(
            "403",
            "Access denied",
            "You don't have permission to perform this action.",
            "Contact Support",
            Tone::Critical,
        ),
        "https://help.smsdesk.app/permissions",
    ),
    entry(
        "404",
        "Not found",
        "The requested item could not be found. It may have been deleted.",
        "Refresh",
        Tone::Warning,
    ),
    with_help(
        entry(
            "409",
            "App setup required",
            "The app needs to be installed or reinstalled for this store before you can continue.",
            "Install app",
            Tone::Critical,
        ),
        "https://help.smsdesk.app/install",
    ),
    entry(
        "422",
        "Invalid input",
        "Some of the information you entered is invalid. Check your input and try again.",
        "Check input",
        Tone::Warning,
    ),
    retryable(
        entry(
            "429",
            "Too many requests",
            "You're sending requests too quickly. Please wait a moment and try again.",
            "Retry",
            Tone::Warning,
        ),
        Duration::from_secs(60),
    ),
    retryable(
        entry(
            "500",
            "Server error",
            "Something went wrong on our end. Please try again.",
            "Retry",
            Tone::Critical,
        ),
        Duration::from_secs(5),
    ),
    retryable(
        entry(
            "502",
            "Bad gateway",
            "Our servers are temporarily unreachable. Please try again shortly.",
            "Retry",
            Tone::Critical,
        ),
        Duration::from_secs(10),
    ),
    retryable(
        entry(
            "503",
            "Service unavailable",
            "The service is temporarily unavailable. Please try again in a few minutes.",
            "Retry",
            Tone::Critical,
        ),
        Duration::from_secs(30),
    ),
    // Application codes
    entry(
        AUTH_REQUIRED,
        "Sign-in required",
        "We couldn't verify your session. Please re-authenticate to continue.",
        "Re-authenticate",
        Tone::Critical,
    ),
    entry(
        "campaign_not_found",
        "Campaign not found",
        "This campaign no longer exists. It may have been deleted.",
        "Back to campaigns",
        Tone::Warning,
    ),
    entry(
        "discount_not_found",
        "Discount not found",
        "This discount no longer exists. It may have been deleted.",
        "Back to discounts",
        Tone::Warning,
    ),
    entry(
        "segment_not_found",
        "Segment not found",
        "This segment no longer exists. It may have been deleted.",
        "Back to segments",
        Tone::Warning,
    ),
    entry(
        "contact_not_found",
        "Contact not found",
        "This contact no longer exists. It may have been removed.",
        "Back to contacts",
        Tone::Warning,
    ),
    entry(
        "automation_not_found",
        "Automation not found",
        "This automation no longer exists.",
        "Back to automations",
        Tone::Warning,
    ),
    entry(
        "discount_conflict",
        "Discount code already exists",
        "A discount with this code already exists. Choose a different code.",
        "Change code",
        Tone::Warning,
    ),
    entry(
        "invalid_phone",
        "Invalid phone number",
        "Please enter a valid phone number.",
        "Check input",
        Tone::Warning,
    ),
    entry(
        "invalid_discount",
        "Invalid discount",
        "The discount settings are invalid. Check the value and dates, then try again.",
        "Check input",
        Tone::Warning,
    ),
    entry(
        "invalid_segment",
        "Invalid segment",
        "One or more segment conditions are invalid. Check your conditions and try again.",
        "Check input",
        Tone::Warning,
    ),
    // Transport conditions
    retryable(
        entry(
            NETWORK_ERROR,
            "Connection problem",
            "We couldn't reach the server. Check your internet connection and try again.",
            "Retry",
            Tone::Warning,
        ),
        Duration::from_secs(5),
    ),
    retryable(
        entry(
            TIMEOUT_ERROR,
            "Request timed out",
            "The server took too long to respond. Please try again.",
            "Retry",
            Tone::Warning,
        ),
        Duration::from_secs(5),
    ),
    with_help(
        entry(
            UNKNOWN_ERROR,
            "Something went wrong",
            "An unexpected error occurred. Please try again or contact support if the problem persists.",
            "Contact Support",
            Tone::Critical,
        ),
        "https://help.smsdesk.app/support",
    ),
];

static INDEX: Lazy<HashMap<&'static str, &'static TaxonomyEntry>> =
    Lazy::new(|| ENTRIES.iter().map(|entry| (entry.code, entry)).collect());

static TIMEOUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(timed?\s?out|timeout|deadline exceeded|aborterror)\b")
        .expect("TIMEOUT_PATTERN should compile - this is a bug")
});

static NETWORK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(network|failed to fetch|connection (refused|reset|closed)|econnrefused|econnreset|no response|offline|dns)",
    )
    .expect("NETWORK_PATTERN should compile - this is a bug")
});

/// All entries, in table order
pub fn entries() -> &'static [TaxonomyEntry] {
    ENTRIES
}

/// Look up an entry by symbolic code
pub fn lookup(code: &str) -> Option<&'static TaxonomyEntry> {
    INDEX.get(code).copied()
}

/// Symbolic code mapped from an HTTP status, if the status is in the table
pub fn status_code(status: u16) -> Option<&'static str> {
    STATUS_CODES.iter().find(|(candidate, _)| *candidate == status).map(|(_, code)| *code)
}

/// Fallback entry; always present
pub fn unknown() -> &'static TaxonomyEntry {
    INDEX.get(UNKNOWN_ERROR).copied().unwrap_or(&ENTRIES[ENTRIES.len() - 1])
}

/// Transport condition detected without a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
}

/// Everything the taxonomy looks at when classifying a failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSignal {
    pub status: Option<u16>,
    pub code: Option<String>,
    pub kind: Option<FailureKind>,
    pub message: Option<String>,
}

impl ErrorSignal {
    /// Signal carrying only an HTTP status
    pub fn from_status(status: u16) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    /// Signal carrying only an application code
    pub fn from_code(code: impl Into<String>) -> Self {
        Self { code: Some(code.into()), ..Self::default() }
    }

    /// No response was received
    pub fn network() -> Self {
        Self { kind: Some(FailureKind::Network), ..Self::default() }
    }

    /// The attempt timed out
    pub fn timeout() -> Self {
        Self { kind: Some(FailureKind::Timeout), ..Self::default() }
    }

    /// Signal from free text, e.g. a surfaced exception message
    pub fn from_message(message: &str) -> Self {
        Self { message: Some(message.to_string()), ..Self::default() }
    }

    /// Signal from an arbitrary JSON value.
    ///
    /// Objects are probed for `status`, `error`/`code`, `message` and
    /// `name`; numbers are treated as statuses and strings as messages.
    /// Anything else yields an empty signal.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(number) => {
                number.as_u64().and_then(as_status).map(Self::from_status).unwrap_or_default()
            }
            Value::String(text) => Self::from_message(text),
            Value::Object(map) => {
                let status = map.get("status").and_then(|status| match status {
                    Value::Number(number) => number.as_u64().and_then(as_status),
                    Value::String(text) => text.trim().parse::<u64>().ok().and_then(as_status),
                    _ => None,
                });
                let code = ["error", "code"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .map(str::to_string);
                let message = map.get("message").and_then(Value::as_str).map(str::to_string);
                let kind = match map.get("name").and_then(Value::as_str) {
                    Some("AbortError" | "TimeoutError") => Some(FailureKind::Timeout),
                    Some("NetworkError") => Some(FailureKind::Network),
                    _ => None,
                };
                Self { status, code, kind, message }
            }
            Value::Null | Value::Bool(_) | Value::Array(_) => Self::default(),
        }
    }
}

fn as_status(raw: u64) -> Option<u16> {
    u16::try_from(raw).ok().filter(|status| (100..=599).contains(status))
}

impl From<&ApiError> for ErrorSignal {
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::Credential(_) => Self::from_code(AUTH_REQUIRED),
            ApiError::RateLimited { body, .. } => Self {
                status: Some(429),
                code: body.code().map(str::to_string),
                message: body.message().map(str::to_string),
                ..Self::default()
            },
            ApiError::Status { status, body } => Self {
                status: Some(*status),
                code: body.code().map(str::to_string),
                message: body.message().map(str::to_string),
                ..Self::default()
            },
            ApiError::Network(message) => {
                Self { kind: Some(FailureKind::Network), ..Self::from_message(message) }
            }
            ApiError::Timeout(_) => Self::timeout(),
            ApiError::Decode(message)
            | ApiError::InvalidRequest(message)
            | ApiError::Config(message) => Self::from_message(message),
        }
    }
}

/// Classify a failure signal. Pure and total.
pub fn classify(signal: &ErrorSignal) -> &'static TaxonomyEntry {
    if let Some(entry) = signal.code.as_deref().and_then(lookup) {
        return entry;
    }

    if let Some(entry) = signal.status.and_then(status_code).and_then(lookup) {
        return entry;
    }

    match signal.kind {
        Some(FailureKind::Timeout) => return lookup(TIMEOUT_ERROR).unwrap_or_else(unknown),
        Some(FailureKind::Network) => return lookup(NETWORK_ERROR).unwrap_or_else(unknown),
        None => {}
    }

    // Only unanswered failures are pattern-matched; a response with an
    // unmapped status stays unknown.
    if signal.status.is_none() {
        if let Some(message) = signal.message.as_deref() {
            if TIMEOUT_PATTERN.is_match(message) {
                return lookup(TIMEOUT_ERROR).unwrap_or_else(unknown);
            }
            if NETWORK_PATTERN.is_match(message) {
                return lookup(NETWORK_ERROR).unwrap_or_else(unknown);
            }
        }
    }

    unknown()
}

/// Classify an [`ApiError`]
pub fn classify_error(error: &ApiError) -> &'static TaxonomyEntry {
    classify(&ErrorSignal::from(error))
}

/// Classify an arbitrary JSON value (`null`, strings, malformed objects)
pub fn classify_value(value: &Value) -> &'static TaxonomyEntry {
    classify(&ErrorSignal::from_json(value))
}

/// A raised failure paired with the entry it matched
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    error: ApiError,
    entry: &'static TaxonomyEntry,
}

impl ClassifiedError {
    /// Classify `error` once and keep both
    pub fn new(error: ApiError) -> Self {
        let entry = classify_error(&error);
        Self { error, entry }
    }

    /// Original error
    pub fn error(&self) -> &ApiError {
        &self.error
    }

    /// Matching taxonomy entry
    pub fn entry(&self) -> &'static TaxonomyEntry {
        self.entry
    }

    /// Give back the original error
    pub fn into_inner(self) -> ApiError {
        self.error
    }
}

impl From<ApiError> for ClassifiedError {
    fn from(error: ApiError) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry.title, self.entry.message)
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
