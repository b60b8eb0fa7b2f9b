//! Request observability wrapper
//!
//! [`RequestObserver::observe`] wraps one facade call. It times the call
//! per (endpoint, method), logs the outcome with parameters passed through
//! the [`Redactor`], and on failure either performs the install redirect
//! (409 with `install_url`) or publishes an `api-error` event carrying the
//! classified, user-facing message. The original error is always returned
//! unchanged.

use std::future::Future;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use smsdesk_common::error::{ErrorClassification, ErrorSeverity};
use smsdesk_common::privacy::Redactor;
use tracing::{debug, error, info, warn};

use super::errors::ApiError;
use super::events::{AppEvent, EventBus};
use crate::observability::metrics::RequestMetrics;

/// Performs navigation side effects requested by the API layer
pub trait Navigator: Send + Sync {
    fn redirect(&self, url: &str);
}

/// Navigator that only records the redirect in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn redirect(&self, url: &str) {
        info!(url, "install redirect requested");
    }
}

/// Instruments facade calls; cheap to share behind an `Arc`
#[derive(Clone)]
pub struct RequestObserver {
    bus: EventBus,
    navigator: Arc<dyn Navigator>,
    redactor: Redactor,
    metrics: Arc<RequestMetrics>,
}

impl Default for RequestObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestObserver")
            .field("bus", &self.bus)
            .field("redactor", &self.redactor)
            .finish_non_exhaustive()
    }
}

impl RequestObserver {
    /// Observer publishing on the process-wide bus
    pub fn new() -> Self {
        Self {
            bus: EventBus::global().clone(),
            navigator: Arc::new(LoggingNavigator),
            redactor: Redactor::new(),
            metrics: Arc::new(RequestMetrics::new()),
        }
    }

    /// Publish events on `bus`
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Perform install redirects through `navigator`
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Replace the redaction rules applied to logged values
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Record timings into a shared registry
    pub fn with_metrics(mut self, metrics: Arc<RequestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Per-endpoint timings recorded so far
    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }

    /// Run `call`, recording and reporting its outcome.
    ///
    /// `params` are the caller-visible inputs of the call; they are only
    /// ever logged after redaction.
    pub async fn observe<T, F>(
        &self,
        endpoint: &str,
        method: &Method,
        params: Value,
        call: F,
    ) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let timer = self.metrics.start(endpoint, method.as_str());
        let result = call.await;
        let elapsed = timer.stop(result.is_ok());
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(_) => {
                let params = self.redactor.redact_value(&params);
                debug!(endpoint, %method, duration_ms, %params, "API call succeeded");
            }
            Err(err) => self.report_failure(endpoint, method, duration_ms, &params, err),
        }

        result
    }

    fn report_failure(
        &self,
        endpoint: &str,
        method: &Method,
        duration_ms: u64,
        params: &Value,
        err: &ApiError,
    ) {
        let entry = err.taxonomy_entry();

        if let Some(url) = err.install_redirect() {
            info!(endpoint, %method, code = entry.code, "app not installed, redirecting");
            self.navigator.redirect(url);
        } else {
            self.bus.publish(AppEvent::api_error(entry.message));
        }

        let params = self.redactor.redact_value(params);
        let detail = self.redactor.redact_str(&err.to_string());
        let status = err.status();
        match err.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => error!(
                endpoint, %method, duration_ms, code = entry.code, ?status, %params,
                error = %detail, "API call failed"
            ),
            ErrorSeverity::Warning => warn!(
                endpoint, %method, duration_ms, code = entry.code, ?status, %params,
                error = %detail, "API call failed"
            ),
            ErrorSeverity::Info => info!(
                endpoint, %method, duration_ms, code = entry.code, ?status, %params,
                error = %detail, "API call failed"
            ),
        }
    }
}
