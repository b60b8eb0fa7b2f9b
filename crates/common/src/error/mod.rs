//! Error classification shared across SMSDesk crates
//!
//! Every error type that reaches a retry loop, a log line or a UI banner
//! implements [`ErrorClassification`], so those three consumers agree on
//! what a failure means:
//!
//! - **`is_retryable()`**: can the same operation succeed if attempted again?
//! - **`severity()`**: how loudly should it be logged and surfaced?
//! - **`is_critical()`**: does it block the user from continuing?
//! - **`retry_after()`**: suggested wait before trying again, if any
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Resource not found |
//! | **Warning** | Degraded but recoverable | Rate limiting, invalid input, timeouts |
//! | **Error** | Failure requiring attention | Unclassified failures |
//! | **Critical** | User is blocked | Expired session, missing permission, server down |
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use smsdesk_common::error::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum UploadError {
//!     Throttled(Duration),
//!     Rejected,
//! }
//!
//! impl ErrorClassification for UploadError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Throttled(_))
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Throttled(_) => ErrorSeverity::Warning,
//!             Self::Rejected => ErrorSeverity::Error,
//!         }
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         match self {
//!             Self::Throttled(delay) => Some(*delay),
//!             Self::Rejected => None,
//!         }
//!     }
//! }
//!
//! assert!(UploadError::Throttled(Duration::from_secs(1)).is_retryable());
//! assert!(!UploadError::Rejected.is_critical());
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: rate limiting, server-side failures,
    /// dropped connections and timeouts.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging level and UI tone decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when a specific delay is recommended
    /// (e.g. from a `Retry-After` header), `None` otherwise.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Unified severity level for logging and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flaky;

    impl ErrorClassification for Flaky {
        fn is_retryable(&self) -> bool {
            true
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Critical
        }
    }

    #[test]
    fn default_methods_derive_from_severity() {
        assert!(Flaky.is_critical());
        assert_eq!(Flaky.retry_after(), None);
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
