//! Bounded retry for individual weather API requests.
//!
//! Every failure is retried (connect errors, timeouts, non-2xx statuses and
//! undecodable bodies) until `max_attempts` is reached; the last failure is
//! returned to the caller. Attempts follow each other immediately unless a
//! backoff is configured.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wxboard_core::WeatherConfig;

use crate::error::FetchError;

/// Default retry configuration
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Exponential backoff between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the second attempt (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
}

impl Backoff {
    /// Calculate the delay before retry number `retry` (0-based)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        // Exponential backoff: initial_delay * 2^retry
        let factor = 2u64.saturating_pow(retry);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, the first one included
    pub max_attempts: u32,
    /// `None` retries immediately
    pub backoff: Option<Backoff>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: None,
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: None,
        }
    }

    pub fn with_backoff(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff: Some(Backoff {
                initial_delay: Duration::from_millis(initial_delay_ms),
                max_delay: Duration::from_millis(max_delay_ms),
            }),
        }
    }

    pub fn from_config(config: &WeatherConfig) -> Self {
        if config.retry_backoff_ms == 0 {
            Self::immediate(config.max_attempts)
        } else {
            Self::with_backoff(
                config.max_attempts,
                config.retry_backoff_ms,
                config.retry_backoff_max_ms,
            )
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.backoff
            .map(|b| b.delay_for_retry(retry))
            .unwrap_or(Duration::ZERO)
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// # Errors
/// Returns the last attempt's error, or [`FetchError::Cancelled`] when the
/// token fires between attempts.
///
/// # Example
/// ```ignore
/// let doc: PointsDocument = with_retry(&policy, &cancel, || async {
///     fetch_json(&client, &url).await
/// }).await?;
/// ```
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        attempt += 1;
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("Request succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            tracing::debug!("Non-retryable error: {}", error);
            return Err(error);
        }

        if attempt >= max_attempts {
            tracing::warn!("All {} attempts exhausted: {}", max_attempts, error);
            return Err(error);
        }

        tracing::warn!(
            "Attempt {} of {} failed: {}",
            attempt,
            max_attempts,
            error
        );

        let delay = policy.delay_for_retry(attempt - 1);
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
