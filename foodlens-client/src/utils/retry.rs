//! Retry with exponential backoff
//!
//! Attempts run strictly one after another. Each attempt may be raced
//! against a timer; whichever settles first wins and the loser is dropped,
//! which aborts the in-flight request (or discards the timer). A
//! [`CancellationToken`] aborts the whole call, including a pending backoff.
//!
//! **Backoff Strategy:**
//! - Delay before attempt n+1: `2^(n-1) * base_delay`
//! - No cap; attempt counts are small

use crate::error::{ClientError, ClientResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry parameters for one kind of call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below 1 are treated as 1
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Race each attempt against this timer when set
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            attempt_timeout: None,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Delay to wait after `failed_attempt` (1-based) before the next one
    pub fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Per-call retry bookkeeping, dropped when the call ends
#[derive(Debug)]
struct RetryState {
    attempt: u32,
    max_attempts: u32,
    last_error: Option<ClientError>,
}

impl RetryState {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
        }
    }

    fn has_attempts_left(&self) -> bool {
        self.attempt < self.max_attempts
    }

    fn into_error(self) -> ClientError {
        self.last_error.unwrap_or_else(|| {
            ClientError::InvalidInput("retry loop finished without an attempt".to_string())
        })
    }
}

/// Race `operation` against `timeout` and `cancel`
///
/// The losing branch is dropped: a timed-out request future is cancelled,
/// a completed request discards its timer.
pub async fn with_timeout<T, Fut>(
    operation: Fut,
    timeout: Duration,
    cancel: &CancellationToken,
) -> ClientResult<T>
where
    Fut: Future<Output = ClientResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        result = operation => result,
        _ = tokio::time::sleep(timeout) => Err(ClientError::Timeout(timeout)),
    }
}

async fn run_attempt<T, Fut>(
    operation: Fut,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> ClientResult<T>
where
    Fut: Future<Output = ClientResult<T>>,
{
    match timeout {
        Some(timeout) => with_timeout(operation, timeout, cancel).await,
        None => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                result = operation => result,
            }
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "upload /analyze")
/// * `policy` - Attempt count, backoff base and optional per-attempt timeout
/// * `cancel` - Aborts the call at the next suspension point
/// * `is_retryable` - Decides whether an error earns another attempt
/// * `operation` - Called with the 1-based attempt number
///
/// # Returns
/// The first success, or the last observed error
pub async fn retry_with_backoff<T, F, Fut, P>(
    operation_name: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    is_retryable: P,
    mut operation: F,
) -> ClientResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ClientResult<T>>,
    P: Fn(&ClientError) -> bool,
{
    let mut state = RetryState::new(policy.max_attempts);

    while state.has_attempts_left() {
        state.attempt += 1;

        tracing::debug!(
            operation = operation_name,
            attempt = state.attempt,
            max_attempts = state.max_attempts,
            "Starting attempt"
        );

        match run_attempt(operation(state.attempt), policy.attempt_timeout, cancel).await {
            Ok(result) => {
                if state.attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt = state.attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(ClientError::Cancelled) => {
                tracing::info!(
                    operation = operation_name,
                    attempt = state.attempt,
                    "Operation cancelled"
                );
                return Err(ClientError::Cancelled);
            }
            Err(err) if !is_retryable(&err) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt = state.attempt,
                    error = %err,
                    "Non-retryable failure, giving up"
                );
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt = state.attempt,
                    max_attempts = state.max_attempts,
                    error = %err,
                    "Attempt failed"
                );
                state.last_error = Some(err);

                if !state.has_attempts_left() {
                    break;
                }

                let delay = policy.backoff_delay(state.attempt);
                tracing::debug!(
                    operation = operation_name,
                    backoff_ms = delay.as_millis() as u64,
                    "Waiting before next attempt"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    tracing::error!(
        operation = operation_name,
        attempts = state.attempt,
        "Operation failed: attempts exhausted"
    );
    Err(state.into_error())
}
