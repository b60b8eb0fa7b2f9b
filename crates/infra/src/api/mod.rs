//! Dashboard API client for SMSDesk
//!
//! This module provides the HTTP-based client the storefront dashboard uses
//! to talk to the SMSDesk backend.
//!
//! # Architecture
//!
//! - [`shop`]: tenant resolution from the hosting page's inputs
//! - [`client`]: resilient transport (correlation id, credentials, bounded
//!   retries with capped exponential backoff and `Retry-After`)
//! - [`taxonomy`]: static classification of failures into user-facing entries
//! - [`observer`]: timing, redacted logging and `api-error` events around
//!   each facade call
//! - [`commands`]: typed operation facade (campaigns, discounts, segments,
//!   contacts, automations)

pub mod auth;
pub mod client;
pub mod commands;
pub mod errors;
pub mod events;
pub mod observer;
pub mod request;
pub mod shop;
pub mod taxonomy;

pub use auth::{CredentialError, CredentialProvider, StaticTokenProvider};
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig, TransientFailurePolicy};
pub use commands::ApiCommands;
pub use errors::{ApiError, ErrorBody, StructuredError};
pub use events::{AppEvent, EventBus};
pub use observer::{LoggingNavigator, Navigator, RequestObserver};
pub use request::OutgoingRequest;
pub use shop::{PageContext, SharedPageContext, ShopInputs, ShopResolver, StaticPageContext};
pub use taxonomy::{classify, classify_error, ClassifiedError, ErrorSignal, TaxonomyEntry, Tone};
