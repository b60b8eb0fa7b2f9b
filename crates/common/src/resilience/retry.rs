//! Retry executor with capped exponential backoff
//!
//! The executor runs an operation up to `max_retries + 1` times. After each
//! failure a [`RetryPolicy`] decides whether the error is worth another
//! attempt and, optionally, how long to wait (e.g. a server-provided
//! `Retry-After`). Waiting goes through a [`Sleeper`] so tests can record
//! the schedule instead of actually sleeping.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::sleeper::{Sleeper, TokioSleeper};

/// Terminal failure of a retry sequence
///
/// Both variants carry the last error produced by the operation, so callers
/// can surface the original failure via [`RetryError::into_inner`].
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The policy declined to retry this error
    #[error("operation failed with non-retryable error after {attempts} attempt(s): {source:?}")]
    NonRetryable { attempts: u32, source: E },

    /// Every permitted attempt failed with a retryable error
    #[error("all {attempts} attempts exhausted, last error: {source:?}")]
    AttemptsExhausted { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    /// Unwrap the last error the operation produced
    pub fn into_inner(self) -> E {
        match self {
            Self::NonRetryable { source, .. } | Self::AttemptsExhausted { source, .. } => source,
        }
    }

    pub fn source_ref(&self) -> &E {
        match self {
            Self::NonRetryable { source, .. } | Self::AttemptsExhausted { source, .. } => source,
        }
    }

    /// Physical attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::NonRetryable { attempts, .. } | Self::AttemptsExhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Decides whether a failed attempt should be retried
pub trait RetryPolicy<E> {
    /// `attempt` is the 0-based index of the attempt that just failed
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

impl<E, F> RetryPolicy<E> for F
where
    F: Fn(&E, u32) -> RetryDecision,
{
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
        self(error, attempt)
    }
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the computed backoff delay
    Retry,
    /// Retry after a caller-supplied delay (still capped at `max_delay`)
    RetryAfter(Duration),
    /// Give up and surface the error
    Stop,
}

/// Capped exponential backoff: `min(base_delay * 2^attempt, max_delay)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Backoff {
    pub const fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self { base_delay, max_delay }
    }

    /// Delay to wait after the failure of attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.checked_mul(factor).unwrap_or(self.max_delay).min(self.max_delay)
    }

    /// Clamp an externally supplied delay to the configured ceiling
    pub fn clamp(&self, delay: Duration) -> Duration {
        delay.min(self.max_delay)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Randomisation applied to computed backoff delays
///
/// Jitter only ever shortens a delay, so the cap always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Use the computed delay as-is
    #[default]
    None,
    /// Uniform in `[0, delay]`
    Full,
    /// Uniform in `[delay / 2, delay]`
    Equal,
}

impl Jitter {
    pub fn apply(&self, delay: Duration) -> Duration {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 {
            return delay;
        }
        let mut rng = rand::thread_rng();
        match self {
            Self::None => delay,
            Self::Full => Duration::from_millis(rng.gen_range(0..=millis)),
            Self::Equal => Duration::from_millis(rng.gen_range(millis / 2..=millis)),
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    pub backoff: Backoff,
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, backoff: Backoff::default(), jitter: Jitter::None }
    }
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Total physical attempts this configuration permits
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the retry that follows failed attempt `attempt`
    fn delay_after(&self, decision: RetryDecision, attempt: u32) -> Option<Duration> {
        match decision {
            RetryDecision::Stop => None,
            RetryDecision::Retry => Some(self.jitter.apply(self.backoff.delay_for(attempt))),
            RetryDecision::RetryAfter(requested) => Some(self.backoff.clamp(requested)),
        }
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.backoff.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.backoff.max_delay = delay;
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn build(self) -> RetryConfig {
        self.config
    }
}

/// Running totals for an in-flight retry sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Physical attempts started so far
    pub attempts: u32,
    /// Delays waited between attempts, in order
    pub delays: Vec<Duration>,
}

impl RetryState {
    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }
}

/// Result of a retry sequence together with its bookkeeping
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub state: RetryState,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    pub fn attempts(&self) -> u32 {
        self.state.attempts
    }
}

/// The main retry executor
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
    sleeper: Arc<dyn Sleeper>,
}

impl<P> RetryExecutor<P> {
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy, sleeper: Arc::new(TokioSleeper) }
    }

    /// Replace the sleeper used between attempts
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, the policy stops, or attempts run out.
    ///
    /// The closure receives the 0-based attempt index.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    #[instrument(skip_all, fields(max_attempts = self.config.max_attempts()))]
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut state = RetryState::default();
        let max_attempts = self.config.max_attempts();

        loop {
            let attempt = state.attempts;
            state.attempts += 1;
            debug!(attempt = state.attempts, max_attempts, "executing attempt");

            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation succeeded after retries");
                    }
                    return RetryOutcome { result: Ok(value), state };
                }
                Err(error) => error,
            };

            let decision = self.policy.should_retry(&error, attempt);
            let Some(delay) = self.config.delay_after(decision, attempt) else {
                debug!(attempt = state.attempts, ?error, "retry policy stopped");
                let attempts = state.attempts;
                return RetryOutcome {
                    result: Err(RetryError::NonRetryable { attempts, source: error }),
                    state,
                };
            };

            if state.attempts >= max_attempts {
                warn!(attempts = state.attempts, ?error, "all retry attempts exhausted");
                let attempts = state.attempts;
                return RetryOutcome {
                    result: Err(RetryError::AttemptsExhausted { attempts, source: error }),
                    state,
                };
            }

            warn!(attempt = state.attempts, ?delay, ?error, "attempt failed, retrying");
            self.sleeper.sleep(delay).await;
            state.delays.push(delay);
        }
    }
}
