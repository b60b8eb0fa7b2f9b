//! # SMSDesk Domain
//!
//! Business domain types and models for the SMSDesk dashboard API client.
//!
//! This crate contains:
//! - Wire DTOs exchanged with the backend (campaigns, discounts, segments,
//!   contacts, automations)
//! - The tenant identifier (`ShopDomain`)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Wire constants (header names, event names)
//!
//! ## Architecture
//! - No dependencies on other SMSDesk crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
