//! Call metrics for a single API endpoint
//!
//! Tracks call counts, failure counts and a ring buffer of durations for
//! P50/P95/P99 calculations.
//!
//! ## Design
//! - **VecDeque ring buffer** for O(1) eviction (not Vec with remove(0))
//! - **Poison-safe locking** with explicit match pattern (no .expect())
//! - **SeqCst ordering** for atomics used in derived metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::observability::{MetricsError, MetricsResult};

/// Maximum number of duration samples retained per endpoint
pub const MAX_SAMPLES: usize = 1000;

/// Metrics for one (endpoint, method) pair
#[derive(Debug)]
pub struct CallMetrics {
    /// Total number of completed calls
    pub total_calls: AtomicUsize,
    /// Calls that completed with an error
    pub failed_calls: AtomicUsize,
    /// Call durations in milliseconds (ring buffer, max [`MAX_SAMPLES`])
    pub durations: Mutex<VecDeque<u64>>,
}

impl Default for CallMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CallMetrics {
    /// Empty metrics
    pub fn new() -> Self {
        Self {
            total_calls: AtomicUsize::new(0),
            failed_calls: AtomicUsize::new(0),
            durations: Mutex::new(VecDeque::with_capacity(64)),
        }
    }

    /// Record one completed call
    pub fn record(&self, duration: Duration, success: bool) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if !success {
            self.failed_calls.fetch_add(1, Ordering::SeqCst);
        }

        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut durations = self.lock_durations("record");
        durations.push_back(ms);
        if durations.len() > MAX_SAMPLES {
            durations.pop_front();
        }
    }

    /// Calls recorded
    pub fn total(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Failed calls recorded
    pub fn failures(&self) -> usize {
        self.failed_calls.load(Ordering::SeqCst)
    }

    /// Fraction of calls that failed, `0.0` when nothing was recorded
    pub fn error_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.failures() as f64 / total as f64
    }

    /// Mean duration across retained samples
    pub fn average_ms(&self) -> MetricsResult<f64> {
        let durations = self.lock_durations("average");
        if durations.is_empty() {
            return Err(MetricsError::EmptyData { metric: "average" });
        }
        let sum: u64 = durations.iter().sum();
        Ok(sum as f64 / durations.len() as f64)
    }

    /// Median duration in milliseconds
    pub fn p50_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.50, "P50")
    }

    /// 95th percentile duration in milliseconds
    pub fn p95_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.95, "P95")
    }

    /// 99th percentile duration in milliseconds
    pub fn p99_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.99, "P99")
    }

    /// Holds the lock for the whole computation for a consistent snapshot.
    fn percentile(&self, percentile: f64, metric_name: &'static str) -> MetricsResult<u64> {
        let durations = self.lock_durations(metric_name);

        if durations.is_empty() {
            return Err(MetricsError::EmptyData { metric: metric_name });
        }

        let mut sorted: Vec<u64> = durations.iter().copied().collect();
        sorted.sort_unstable();

        let index = ((sorted.len() as f64 * percentile) as usize).min(sorted.len() - 1);
        Ok(sorted[index])
    }

    fn lock_durations(&self, operation: &'static str) -> MutexGuard<'_, VecDeque<u64>> {
        match self.durations.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(
                    metric = "CallMetrics::durations",
                    operation,
                    "Mutex poisoned, recovering data"
                );
                poison_err.into_inner()
            }
        }
    }
}
