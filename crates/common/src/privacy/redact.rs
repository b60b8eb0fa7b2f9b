// Recursive redaction of sensitive values before they reach log output

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Placeholder written in place of any sensitive value
pub const REDACTED: &str = "[REDACTED]";

/// Placeholder for subtrees nested deeper than the configured limit
pub const TRUNCATED: &str = "[TRUNCATED]";

/// Default maximum nesting depth visited by [`Redactor::redact_value`]
pub const DEFAULT_MAX_DEPTH: usize = 8;

pub(crate) const EMAIL_PATTERN: &str = r"(?u)\b[\p{L}\p{N}._%+-]+@[\p{L}\p{N}.-]+\.[\p{L}]{2,}\b";

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_REGEX should compile - this is a bug"));

static BEARER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9\-._~+/]+=*")
        .expect("BEARER_REGEX should compile - this is a bug")
});

static JWT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*")
        .expect("JWT_REGEX should compile - this is a bug")
});

static CARD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{1,7}\b")
        .expect("CARD_REGEX should compile - this is a bug")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{3}\)|\b\d{3})[\s.-]?\d{3}[\s.-]?\d{4}\b")
        .expect("PHONE_REGEX should compile - this is a bug")
});

/// Key fragments that mark a field as sensitive regardless of its value
const DEFAULT_SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "authorization",
    "api_key",
    "apikey",
    "session",
    "cookie",
    "phone",
    "email",
    "card_number",
    "cvv",
    "ssn",
];

/// Replaces sensitive values in strings and JSON trees with [`REDACTED`].
///
/// Two passes are applied:
/// - values stored under a sensitive-sounding key are replaced wholesale
/// - every other string is scanned for emails, phone numbers, bearer/JWT
///   tokens and card-number-like digit groups
///
/// Recursion stops at `max_depth`; deeper containers become [`TRUNCATED`].
#[derive(Debug, Clone)]
pub struct Redactor {
    sensitive_keys: Vec<String>,
    max_depth: usize,
}

impl Default for Redactor {
    fn default() -> Self {
        Self {
            sensitive_keys: DEFAULT_SENSITIVE_KEYS.iter().map(|key| (*key).to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Redactor {
    /// Create a redactor with the default key list and depth limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Treat keys containing `fragment` as sensitive
    pub fn with_sensitive_key(mut self, fragment: impl Into<String>) -> Self {
        self.sensitive_keys.push(normalize_key(&fragment.into()));
        self
    }

    /// Whether values under `key` are always replaced
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        let key = normalize_key(key);
        self.sensitive_keys.iter().any(|fragment| key.contains(fragment.as_str()))
    }

    /// Scrub sensitive substrings out of free text
    pub fn redact_str(&self, text: &str) -> String {
        // Tokens first so a JWT is not half-eaten by the digit patterns.
        let mut out: Cow<'_, str> = Cow::Borrowed(text);
        for regex in [&*BEARER_REGEX, &*JWT_REGEX, &*EMAIL_REGEX, &*CARD_REGEX, &*PHONE_REGEX] {
            if regex.is_match(&out) {
                out = Cow::Owned(regex.replace_all(&out, REDACTED).into_owned());
            }
        }
        out.into_owned()
    }

    /// Produce a redacted copy of a JSON tree
    pub fn redact_value(&self, value: &Value) -> Value {
        self.redact_at(value, 0)
    }

    fn redact_at(&self, value: &Value, depth: usize) -> Value {
        match value {
            Value::String(text) => Value::String(self.redact_str(text)),
            Value::Object(_) | Value::Array(_) if depth >= self.max_depth => {
                Value::String(TRUNCATED.to_string())
            }
            Value::Object(map) => {
                let mut redacted = Map::with_capacity(map.len());
                for (key, inner) in map {
                    let replacement = if self.is_sensitive_key(key) && !inner.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        self.redact_at(inner, depth + 1)
                    };
                    redacted.insert(key.clone(), replacement);
                }
                Value::Object(redacted)
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.redact_at(item, depth + 1)).collect())
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}
