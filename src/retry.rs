//! Same-provider retry with exponential backoff, generalized from
//! `ai::retry` to operate over [`AdapterError`] instead of the teacher's
//! `AiProviderError`.

use crate::provider::{is_retryable, AdapterError};
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Initial delay before first retry (in milliseconds).
    pub initial_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// Returns `Ok(T)` on success (on any attempt), or the last `Err` once
/// retries are exhausted or a non-retryable error is hit.
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    config: &RetryConfig,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AdapterError>>,
{
    let mut last_error: Option<AdapterError> = None;
    let mut delay_ms = config.initial_delay_ms;

    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    log::info!("completion succeeded after {} retry attempts", attempt);
                }
                return Ok(result);
            }
            Err(error) => {
                if !is_retryable(&error) {
                    log::warn!("non-retryable error encountered: {}", error);
                    return Err(error);
                }

                if attempt >= config.max_retries {
                    log::warn!(
                        "completion failed after {} attempts, last error: {}",
                        attempt + 1,
                        error
                    );
                    last_error = Some(error);
                    break;
                }

                log::info!(
                    "completion failed (attempt {}/{}): {}. retrying in {}ms",
                    attempt + 1,
                    config.max_retries + 1,
                    error,
                    delay_ms
                );
                last_error = Some(error);

                sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = ((delay_ms as f64) * config.backoff_multiplier) as u64;
                delay_ms = delay_ms.min(config.max_delay_ms);
            }
        }
    }

    Err(last_error.unwrap_or(AdapterError::ShapeError("retry loop exited without error".into())))
}
