//! Exponential-backoff retry for transient write failures (spec §4.1:
//! base 100 ms, cap 5 s, max 5 attempts, surfaced as `StoreUnavailable`
//! after exhaustion).

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

const BASE_DELAY: Duration = Duration::from_millis(100);
const MAX_DELAY: Duration = Duration::from_secs(5);
const MAX_ATTEMPTS: u32 = 5;

/// Retry `op` with exponential backoff. Returns the first success, or
/// [`StoreError::Unavailable`] carrying the last error once attempts are
/// exhausted.
pub async fn with_backoff<T, F, Fut>(mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match op().await {
            Ok(value) => return Ok(value),
            Err(source) if attempt >= MAX_ATTEMPTS => {
                tracing::warn!(attempt, "store write exhausted retries");
                return Err(StoreError::Unavailable { attempts: attempt, source });
            }
            Err(source) => {
                let delay = BASE_DELAY
                    .saturating_mul(1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX))
                    .min(MAX_DELAY);
                tracing::warn!(attempt, %source, ?delay, "retrying store write");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_immediately_without_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, StoreError> = with_backoff(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.unwrap_or(0), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, StoreError> = with_backoff(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(sqlx::Error::RowNotFound) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
