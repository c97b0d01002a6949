//! Retry logic.
//!
//! # Responsibilities
//! - Run one operation as a bounded, sequential retry ladder
//! - Wait `base × n` before the n-th retry
//! - Report exhaustion with the last failure
//!
//! # Design Decisions
//! - Only `Err` is retried; the caller decides what counts as a failure
//!   (the forwarder returns received HTTP statuses as `Ok`)
//! - Attempts are strictly sequential: the next starts only after the
//!   previous failure is observed and the delay has elapsed
//! - The attempt number handed to the operation never exceeds the maximum

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::RetryConfig;
use crate::resilience::backoff::linear_backoff;

/// Bounded linear-backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

/// Every attempt failed.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryError<E: fmt::Display> {
    /// Total dispatches made, initial attempt included.
    pub attempts: u32,
    /// The final failure.
    pub last: E,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }

    /// Retries allowed after the initial attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        linear_backoff(retry, self.base_delay)
    }

    /// Run `op` until it succeeds or the retries are exhausted.
    ///
    /// `op` receives the attempt number: 0 for the initial dispatch, then
    /// 1..=max_retries.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(RetryError {
                        attempts: attempt + 1,
                        last: e,
                    })
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
