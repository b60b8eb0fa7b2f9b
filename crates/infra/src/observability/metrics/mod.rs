//! Metrics collection modules
//!
//! Thread-safe latency metrics for API calls.

pub mod call;
pub mod request;

// Re-export metric types for convenience
pub use call::CallMetrics;
pub use request::{EndpointKey, RequestMetrics, RequestTimer};
