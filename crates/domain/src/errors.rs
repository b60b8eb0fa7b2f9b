//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for SMSDesk setup and infrastructure failures.
///
/// API operation failures have their own taxonomy-aware error type in the
/// infra crate; this enum covers everything that happens before a request
/// is ever issued (configuration, client construction, local I/O).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SmsDeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for SMSDesk operations
pub type Result<T> = std::result::Result<T, SmsDeskError>;
