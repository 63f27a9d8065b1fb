// src/error_recovery.rs
//! Bounded retry with linearly increasing delay for API operations.

use crate::constants::{RETRIEVAL_BASE_DELAY_MS, RETRIEVAL_MAX_ATTEMPTS};
use crate::error::AppError;
use std::time::Duration;

/// How often, and how patiently, a single remote request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay slept after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRIEVAL_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(RETRIEVAL_BASE_DELAY_MS),
        }
    }
}

/// Retries an async operation, waiting `attempt * base_delay` between tries.
///
/// When every attempt fails the last error is returned unchanged. Missing
/// objects and refused credentials are returned at once.
pub async fn retry_linear<F, T, Fut>(
    policy: RetryPolicy,
    description: &str,
    mut operation: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_permanent() => return Err(e),
            Err(e) => {
                if attempt < policy.max_attempts {
                    let delay = policy.delay_after(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        description,
                        attempt,
                        policy.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| AppError::InternalError {
        message: format!("{} was never attempted", description),
        source: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_default_delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = retry_linear(fast_policy(), "flaky", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(AppError::MalformedResponse(format!("boom {}", n)))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_cause() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_linear(fast_policy(), "doomed", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(AppError::MalformedResponse(format!("boom {}", n))) }
        })
        .await;

        assert_eq!(calls.get(), 3);
        match result {
            Err(AppError::MalformedResponse(msg)) => assert_eq!(msg, "boom 3"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_linear(fast_policy(), "missing", || {
            calls.set(calls.get() + 1);
            async {
                Err(AppError::NotionService {
                    code: crate::error::NotionErrorCode::ObjectNotFound,
                    message: "gone".to_string(),
                    status: reqwest::StatusCode::NOT_FOUND,
                })
            }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(result.unwrap_err().is_not_found());
    }
}
