use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Shape of the delay curve between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// `base * 2^n` before retry `n` (n starts at 1).
    Exponential,
    /// `base * n` before retry `n`.
    Linear,
}

/// A bounded retry policy shared by the ledger executor and the REST transport.
///
/// An operation governed by this policy runs at most `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff: Backoff,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, 1000)
    }
}

impl RetryPolicy {
    pub fn exponential(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms: 60_000,
            backoff: Backoff::Exponential,
            jitter: false,
        }
    }

    pub fn linear(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms: 60_000,
            backoff: Backoff::Linear,
            jitter: false,
        }
    }

    pub fn with_max_delay(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts allowed, first try included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay slept before retry number `retry` (1-based).
    ///
    /// With jitter enabled the nominal value is scaled by a factor drawn
    /// from `[0.75, 1.25]`. The result never exceeds `max_delay_ms`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        let nominal = match self.backoff {
            Backoff::Exponential => {
                let factor = 2u64.checked_pow(retry).unwrap_or(u64::MAX);
                self.base_delay_ms.saturating_mul(factor)
            }
            Backoff::Linear => self.base_delay_ms.saturating_mul(retry as u64),
        };
        let nominal = nominal.min(self.max_delay_ms) as f64;

        let delay_ms = if self.jitter {
            nominal * rand::thread_rng().gen_range(0.75..=1.25)
        } else {
            nominal
        };

        Duration::from_millis((delay_ms as u64).min(self.max_delay_ms))
    }
}

/// Terminal outcome of a retried operation.
///
/// Kept distinct from `E` so callers can tell "this attempt failed" apart
/// from "we gave up".
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last_error: E,
    },

    #[error("{operation} aborted on non-retryable error: {last_error}")]
    Aborted { operation: String, last_error: E },
}

impl<E> RetryError<E> {
    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Exhausted { last_error, .. } | RetryError::Aborted { last_error, .. } => {
                last_error
            }
        }
    }

    pub fn into_last_error(self) -> E {
        match self {
            RetryError::Exhausted { last_error, .. } | RetryError::Aborted { last_error, .. } => {
                last_error
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

/// Run `operation` under `policy`, retrying every error.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_retry_if(policy, operation_name, operation, |_| true).await
}

/// Run `operation` under `policy`, retrying only errors accepted by `should_retry`.
pub async fn with_retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut retry = 0u32;
    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    debug!("{} succeeded on attempt {}", operation_name, retry + 1);
                }
                return Ok(value);
            }
            Err(e) if !should_retry(&e) => {
                return Err(RetryError::Aborted {
                    operation: operation_name.to_string(),
                    last_error: e,
                });
            }
            Err(e) => {
                if retry >= policy.max_retries {
                    return Err(RetryError::Exhausted {
                        operation: operation_name.to_string(),
                        attempts: retry + 1,
                        last_error: e,
                    });
                }

                retry += 1;
                let delay = policy.delay_for(retry);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    operation_name,
                    retry,
                    policy.max_attempts(),
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
