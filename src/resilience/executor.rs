//! Retrying call executor.
//!
//! # Responsibilities
//! - Invoke a fallible remote operation up to `max_attempts` times
//! - Sleep for the scheduled backoff between attempts
//! - Report how many attempts were consumed, on success and on exhaustion
//!
//! # Design Decisions
//! - Every remote failure is treated as transient; callers reject
//!   non-retryable requests before reaching the executor
//! - No delay after the final attempt
//! - No overall deadline; latency is bounded by attempts and backoff

use std::future::Future;

use crate::resilience::backoff::BackoffSchedule;

/// Retry policy for remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub backoff: BackoffSchedule,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffSchedule::default(),
        }
    }
}

/// A call that eventually succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<T> {
    pub value: T,
    pub attempts: u32,
}

impl<T> Completed<T> {
    /// Extra attempts beyond the first.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Every attempt failed.
#[derive(Debug, thiserror::Error)]
#[error("all {attempts} attempts exhausted: {last_error}")]
pub struct AttemptsExhausted<E: std::fmt::Display> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: std::fmt::Display> AttemptsExhausted<E> {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct CallExecutor {
    policy: RetryPolicy,
}

impl CallExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the attempts run out.
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut operation: F,
    ) -> Result<Completed<T>, AttemptsExhausted<E>>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return Ok(Completed {
                        value,
                        attempts: attempt,
                    })
                }
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(attempt, error = %e, "Final attempt failed");
                    return Err(AttemptsExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let delay = self.policy.backoff.delay_after(attempt);
                    tracing::warn!(attempt, delay = ?delay, error = %e, "Attempt failed, retrying");
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn failing_until(successful_attempt: u32, calls: &AtomicU32) -> Result<&'static str, String> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= successful_attempt {
            Ok("charged")
        } else {
            Err(format!("failure {}", n))
        }
    }

    fn assert_waited(start: Instant, expected_ms: u64) {
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(expected_ms), "waited {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(expected_ms + 50), "waited {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_with_backoff() {
        let executor = CallExecutor::default();
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = Instant::now();

        let done = executor
            .run(move |_| async move { failing_until(3, calls) })
            .await
            .unwrap();

        assert_eq!(done.value, "charged");
        assert_eq!(done.attempts, 3);
        assert_eq!(done.retries(), 2);
        // 500ms + 1000ms between the three attempts
        assert_waited(start, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_carries_last_error_without_trailing_delay() {
        let executor = CallExecutor::default();
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = Instant::now();

        let err = executor
            .run(move |_| async move { failing_until(u32::MAX, calls) })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(err.retries(), 2);
        assert_eq!(err.last_error, "failure 3");
        assert_waited(start, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_schedule_runs_back_to_back() {
        let executor = CallExecutor::new(RetryPolicy {
            max_attempts: 4,
            backoff: BackoffSchedule::from_millis(&[200]),
        });
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = Instant::now();

        let err = executor
            .run(move |_| async move { failing_until(u32::MAX, calls) })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_waited(start, 200);
    }

    #[tokio::test]
    async fn test_first_try_success_has_no_retries() {
        let executor = CallExecutor::default();
        let seen = AtomicU32::new(0);

        let done = executor
            .run(|attempt| {
                seen.store(attempt, Ordering::SeqCst);
                async { Ok::<_, String>(42) }
            })
            .await
            .unwrap();

        assert_eq!(done.attempts, 1);
        assert_eq!(done.retries(), 0);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
