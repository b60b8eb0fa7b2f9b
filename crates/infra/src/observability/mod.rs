//! Observability infrastructure for logging and request metrics
//!
//! - [`logging`]: `tracing-subscriber` initialization (env filter, optional
//!   JSON output)
//! - [`metrics`]: per-endpoint call counts, error counts and latency
//!   percentiles fed by the request observer
//!
//! ## Design Principles
//!
//! 1. **Poison Recovery**: metric locks recover from poisoning with a
//!    warning instead of panicking.
//! 2. **Ring Buffers**: latency samples live in a bounded `VecDeque` with
//!    O(1) eviction.

pub mod logging;
pub mod metrics;

/// Metrics error type
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "P95", "P50", "average")
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
