//! Bounded retry for endpoint operations

use backoff::{future::retry, ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;

/// How many times an operation is attempted and how long to wait in between.
///
/// Waits grow exponentially from `initial_interval` and are capped at
/// `max_interval`; no jitter is applied so the delay never shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub initial_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_intervals(mut self, initial_interval: Duration, max_interval: Duration) -> Self {
        self.initial_interval = initial_interval;
        self.max_interval = max_interval.max(initial_interval);
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_interval,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or `max_attempts` attempts have been made. The last error is returned.
    pub async fn run<F, Fut, T>(&self, uri: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        retry(self.backoff(), || {
            attempt += 1;
            let current = attempt;
            let pending = operation();
            async move {
                match pending.await {
                    Ok(value) => Ok(value),
                    Err(error) if error.is_retryable() && current < max_attempts => {
                        warn!(
                            uri = %uri,
                            attempt = current,
                            max_attempts,
                            "Retryable error occurred: {}",
                            error
                        );
                        Err(backoff::Error::transient(error))
                    }
                    Err(error) => {
                        if error.is_retryable() {
                            warn!(uri = %uri, attempts = current, "Retry attempts exhausted: {}", error);
                        } else {
                            debug!(uri = %uri, "Non-retryable error: {}", error);
                        }
                        Err(backoff::Error::permanent(error))
                    }
                }
            }
        })
        .await
    }
}
