//! Resilience patterns for transient failures
//!
//! - **Retry**: [`RetryExecutor`] with capped exponential backoff, optional
//!   jitter and policy-driven stop/retry decisions
//! - **Sleeping**: [`Sleeper`] abstraction so backoff schedules are testable
//!   without wall-clock waits ([`RecordingSleeper`])

pub mod retry;
pub mod sleeper;

pub use retry::{
    Backoff, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor,
    RetryOutcome, RetryPolicy, RetryResult, RetryState,
};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
