//! # SMSDesk Infrastructure
//!
//! I/O-facing implementation of the SMSDesk dashboard API client.
//!
//! This crate contains:
//! - The resilient API transport and typed operation facade (`api`)
//! - Configuration loading from environment and files (`config`)
//! - The physical HTTP layer (`http`)
//! - Logging initialization and per-endpoint request metrics
//!   (`observability`)
//!
//! ## Architecture
//! - Wire types and configuration structures live in `smsdesk-domain`
//! - Retry machinery, error classification and redaction come from
//!   `smsdesk-common`
//! - Contains all "impure" code (network, environment, files)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientConfig, ApiCommands, ApiError, AppEvent, CredentialProvider, EventBus,
    OutgoingRequest, RequestObserver, ShopResolver,
};
pub use errors::InfraError;
pub use http::{HttpClient, TransportError};
