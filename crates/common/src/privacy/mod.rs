//! Privacy helpers for keeping customer data out of logs

pub mod redact;

pub use redact::{Redactor, DEFAULT_MAX_DEPTH, REDACTED, TRUNCATED};
