//! Generic retry with exponential backoff.
//!
//! Summarization and remote embedding calls ride flaky transports; this
//! helper wraps any fallible async operation in a bounded retry loop.
//! The ranking core itself never retries (a failed branch degrades to
//! empty instead), so this lives outside the search path, used by the
//! coordinators that drive background work.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff schedule for [`with_retry`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first; at least 1 is always made
    pub max_attempts: usize,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Ceiling on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed 0-based `attempt`: `base * 2^attempt`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = attempt.min(16) as u32;
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds or the policy's attempts run out.
///
/// Every failure short of the last is logged and followed by the
/// policy's backoff delay; the last failure is returned to the caller
/// unchanged. The operation decides nothing about retryability here; a
/// caller whose errors are partly permanent should bail out inside the
/// operation instead of returning `Err`.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// WASM hosts drive retries from their own event loop; the backoff delay
/// collapses to an immediate retry there.
#[cfg(target_arch = "wasm32")]
async fn sleep(_delay: Duration) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn first_success_makes_one_attempt() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);

        let result: Result<i32, String> = with_retry(&fast_policy(3), move || {
            let counter = Rc::clone(&counter);
            async move {
                counter.set(counter.get() + 1);
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);

        let result: Result<&str, String> = with_retry(&fast_policy(5), move || {
            let counter = Rc::clone(&counter);
            async move {
                counter.set(counter.get() + 1);
                if counter.get() < 3 {
                    Err("transient".to_string())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn exhausted_attempts_return_the_last_error() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);

        let result: Result<(), String> = with_retry(&fast_policy(3), move || {
            let counter = Rc::clone(&counter);
            async move {
                counter.set(counter.get() + 1);
                Err(format!("failure {}", counter.get()))
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
        assert_eq!(policy.delay_for(20), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn zero_max_attempts_still_runs_once() {
        let result: Result<i32, String> =
            with_retry(&fast_policy(0), || async { Ok(1) }).await;
        assert_eq!(result.unwrap(), 1);
    }
}
