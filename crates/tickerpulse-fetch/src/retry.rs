//! Exponential backoff for transient page-fetch failures.
//!
//! HTTP 429 and network-level failures are retried; everything else
//! (404, other statuses, anti-bot challenges, bad URLs) is returned
//! immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// - [`FetchError::RateLimited`]: HTTP 429 without a challenge page.
/// - [`FetchError::Http`]: connection reset, timeout, TLS hiccup.
///
/// A [`FetchError::ManualInterventionRequired`] is never retried: hammering a
/// challenge page only makes the block last longer.
fn is_retriable(err: &FetchError) -> bool {
    matches!(err, FetchError::RateLimited { .. } | FetchError::Http(_))
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)` seconds.
/// With `max_retries = 3` the operation runs at most 4 times. Non-retriable
/// errors are returned without sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        let last_err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient fetch error; retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
