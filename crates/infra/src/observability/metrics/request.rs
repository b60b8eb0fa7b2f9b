//! Per-endpoint request timing
//!
//! The request observer starts a [`RequestTimer`] keyed by the logical
//! endpoint name (`campaigns.list`) and HTTP method before each facade call
//! and stops it when the call settles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::call::CallMetrics;

/// Metrics registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    pub endpoint: String,
    pub method: String,
}

impl EndpointKey {
    /// Key for `endpoint` called with `method`
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), method: method.into().to_ascii_uppercase() }
    }
}

/// Registry of [`CallMetrics`] keyed by (endpoint, method)
#[derive(Debug, Default)]
pub struct RequestMetrics {
    endpoints: Mutex<HashMap<EndpointKey, Arc<CallMetrics>>>,
}

impl RequestMetrics {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing one call
    pub fn start(&self, endpoint: &str, method: &str) -> RequestTimer {
        let key = EndpointKey::new(endpoint, method);
        let metrics = Arc::clone(self.lock_endpoints().entry(key.clone()).or_default());
        RequestTimer { key, metrics, started: Instant::now() }
    }

    /// Metrics for one endpoint, if it has been called
    pub fn get(&self, endpoint: &str, method: &str) -> Option<Arc<CallMetrics>> {
        self.lock_endpoints().get(&EndpointKey::new(endpoint, method)).cloned()
    }

    /// Every endpoint seen so far, sorted by key
    pub fn endpoints(&self) -> Vec<EndpointKey> {
        let mut keys: Vec<EndpointKey> = self.lock_endpoints().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock_endpoints(&self) -> MutexGuard<'_, HashMap<EndpointKey, Arc<CallMetrics>>> {
        match self.endpoints.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(metric = "RequestMetrics::endpoints", "Mutex poisoned, recovering");
                poison_err.into_inner()
            }
        }
    }
}

/// Running timer for one call; consumed by [`RequestTimer::stop`]
#[derive(Debug)]
pub struct RequestTimer {
    key: EndpointKey,
    metrics: Arc<CallMetrics>,
    started: Instant,
}

impl RequestTimer {
    /// Endpoint being timed
    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    /// Record the call and return its duration
    pub fn stop(self, success: bool) -> Duration {
        let elapsed = self.started.elapsed();
        self.metrics.record(elapsed, success);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_feed_the_matching_endpoint() {
        let registry = RequestMetrics::new();

        registry.start("campaigns.list", "get").stop(true);
        registry.start("campaigns.list", "GET").stop(false);
        registry.start("campaigns.create", "POST").stop(true);

        let list = registry.get("campaigns.list", "GET").expect("list metrics");
        assert_eq!(list.total(), 2);
        assert_eq!(list.failures(), 1);

        let create = registry.get("campaigns.create", "post").expect("create metrics");
        assert_eq!(create.total(), 1);

        assert!(registry.get("campaigns.delete", "DELETE").is_none());
        assert_eq!(
            registry.endpoints(),
            vec![
                EndpointKey::new("campaigns.create", "POST"),
                EndpointKey::new("campaigns.list", "GET"),
            ]
        );
    }

    #[test]
    fn stop_returns_elapsed_time() {
        let registry = RequestMetrics::new();
        let timer = registry.start("health", "GET");
        assert_eq!(timer.key().endpoint, "health");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.stop(true) >= Duration::from_millis(5));
    }
}
