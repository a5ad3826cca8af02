//! Bounded retry with exponential backoff for rate-limited model calls

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::Result;

/// Default number of attempts for assistant requests
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the retry following 0-based `attempt`: `2^attempt` seconds
/// plus up to one second of jitter
fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = 2_u64.saturating_pow(attempt) * 1000;
    let jitter_ms = rand::thread_rng().gen_range(0..1000);

    Duration::from_millis(base_ms + jitter_ms)
}

/// Run `op`, retrying rate-limited failures up to `max_attempts` total
/// attempts.
///
/// Only errors classified as rate limits ([`crate::Error::is_rate_limit`])
/// are retried. Any other failure, or exhaustion of attempts, propagates the
/// last error unchanged.
///
/// # Errors
///
/// Returns the last error produced by `op`
pub async fn call_with_retry<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts || !e.is_rate_limit() {
                    return Err(e);
                }

                let delay = backoff_delay(attempt - 1);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay = ?delay,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    use super::*;
    use crate::Error;

    fn rate_limit_error(attempt: u32) -> Error {
        Error::Assistant(format!("HTTP 429: rate limited on attempt {attempt}"))
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limits_up_to_attempt_cap() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = call_with_retry(3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(rate_limit_error(n)) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // The propagated error is the last attempt's, not a synthesized one
        let message = result.unwrap_err().to_string();
        assert!(message.contains("attempt 2"), "got {message}");
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_error_fails_after_one_attempt() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = call_with_retry(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Assistant("invalid API key".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_rate_limit() {
        let calls = AtomicU32::new(0);

        let result = call_with_retry(3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Error::Assistant("quota exhausted".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_exponentially() {
        let start = Instant::now();
        let calls = AtomicU32::new(0);

        let _: Result<()> = call_with_retry(3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(rate_limit_error(n)) }
        })
        .await;

        // Two backoff waits: 1s and 2s base, each with up to 1s jitter
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_is_clamped_to_one() {
        let calls = AtomicU32::new(0);

        let result = call_with_retry(0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
