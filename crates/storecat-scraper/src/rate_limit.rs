//! Retry utilities for page fetches.
//!
//! Provides exponential backoff retry logic for transient HTTP errors such as
//! 429 responses, timeouts and 5xx statuses. Non-retriable errors (404, other
//! 4xx, invalid URLs) are propagated immediately without retrying.

use std::future::Future;
use std::time::Duration;

use crate::cancel::CancelFlag;
use crate::error::ScraperError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::Http`]: network-level failure (connection reset, DNS, etc.).
/// - [`ScraperError::Timeout`]: the page did not arrive within the ready timeout.
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. }
        | ScraperError::Http { .. }
        | ScraperError::Timeout { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Backoff knobs for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Additional attempts after the first try.
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    /// Ceiling for a single wait, applied after `Retry-After` is honored.
    pub max_backoff_secs: u64,
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function waits `backoff_base_secs * 2^attempt`
/// seconds (or the 429 `Retry-After`, if longer), capped at
/// `max_backoff_secs`, and tries again. If all retries are exhausted the last
/// error is returned. With `max_retries = 2` the operation is attempted at
/// most 3 times total.
///
/// The wait ends early when `cancel` is set, returning
/// [`ScraperError::Cancelled`] without another attempt.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancelFlag,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= policy.max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_secs = backoff_delay_secs(&err, policy, attempt);
        tracing::warn!(
            attempt,
            max_retries = policy.max_retries,
            delay_secs,
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        if !cancel.sleep(Duration::from_secs(delay_secs)).await {
            tracing::info!(error = %err, "backoff interrupted by cancellation");
            return Err(ScraperError::Cancelled);
        }
        attempt += 1;
    }
}

/// `backoff_base_secs * 2^attempt`, raised to the server's `Retry-After` on a
/// 429, never above `max_backoff_secs`.
fn backoff_delay_secs(err: &ScraperError, policy: RetryPolicy, attempt: u32) -> u64 {
    // Cap the shift so extreme configs saturate instead of overflowing.
    let exponential = policy
        .backoff_base_secs
        .saturating_mul(1u64 << attempt.min(62));
    let wanted = match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => exponential.max(*retry_after_secs),
        _ => exponential,
    };
    wanted.min(policy.max_backoff_secs)
}
