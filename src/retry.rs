//! Retry policy: deterministic backoff delay calculation plus a generic
//! retry-with-backoff driver supporting four backoff strategies.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff strategy for [`RetryPolicy::delay`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// Always wait `initial_delay`.
    Fixed,
    /// `initial_delay * attempt`, capped at `max_delay`.
    Linear,
    /// `initial_delay * 2^(attempt - 1)`, capped at `max_delay`.
    Exponential,
    /// Exponential with up to 30% random jitter added on top, still capped.
    JitteredExponential,
}

/// Configuration for retry behavior.
///
/// `delay(attempt)` is deterministic except under jitter, and monotonically
/// non-decreasing up to `max_delay`: attempts
/// are 1-indexed.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff: BackoffStrategy::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration, max_delay: Duration, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// The *unjittered* exponential delay for `attempt`, used both by
    /// `Exponential` directly and as the base for `JitteredExponential`.
    fn exponential_base(&self, attempt: u32) -> Duration {
        let initial_ms = self.initial_delay.as_millis() as f64;
        let exponent = attempt.saturating_sub(1);
        let raw = initial_ms * 2f64.powi(exponent as i32);
        Duration::from_millis(raw.min(self.max_delay.as_millis() as f64) as u64)
    }

    /// Delay to wait before the given attempt (1-indexed). Never exceeds
    /// `max_delay`. Deterministic for every strategy except
    /// `JitteredExponential`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            BackoffStrategy::Fixed => self.initial_delay.min(self.max_delay),
            BackoffStrategy::Linear => {
                let raw = self.initial_delay.as_millis() as u64 * attempt as u64;
                Duration::from_millis(raw).min(self.max_delay)
            }
            BackoffStrategy::Exponential => self.exponential_base(attempt),
            BackoffStrategy::JitteredExponential => {
                let base = self.exponential_base(attempt);
                // Up to 30% jitter on top of the base, still capped at max_delay.
                let jitter_fraction = rand::random::<f64>() * 0.3;
                let jittered_ms = base.as_millis() as f64 * (1.0 + jitter_fraction);
                Duration::from_millis(jittered_ms as u64).min(self.max_delay)
            }
        }
    }
}

/// Retry an async operation under `policy`, sleeping `policy.delay(attempt)`
/// between attempts. Attempts are counted from 1 and every failure counts
/// against the budget regardless of kind. Raises
/// [`Error::MaxRetriesExceeded`] with the last underlying cause once the
/// budget is exhausted.
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_retries + 1;
    let mut last_error: Option<Error> = None;

    for attempt in 1..=max_attempts {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_error = Some(err);
                if attempt < max_attempts {
                    sleep(policy.delay(attempt)).await;
                }
            }
        }
    }

    Err(Error::MaxRetriesExceeded(
        last_error.map(|e| e.to_string()).unwrap_or_else(|| "no attempts made".to_string()),
    ))
}

/// Like [`retry_with_policy`], but gives up immediately on an error for which
/// [`Error::is_retryable`] is false instead of spending the retry budget on
/// it. The coordinator's own retry semantics are unconditional; this variant
/// is for callers (e.g. [`crate::generator::HttpGenerator`]) that want
/// to fail fast on configuration errors.
pub async fn retry_with_policy_conditional<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_retries + 1;
    let mut last_error: Option<Error> = None;

    for attempt in 1..=max_attempts {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() {
                    return Err(err);
                }
                last_error = Some(err);
                if attempt < max_attempts {
                    sleep(policy.delay(attempt)).await;
                }
            }
        }
    }

    Err(Error::MaxRetriesExceeded(
        last_error.map(|e| e.to_string()).unwrap_or_else(|| "no attempts made".to_string()),
    ))
}
