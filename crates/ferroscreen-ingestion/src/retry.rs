//! Bounded retry for registry calls.
//!
//! A fixed number of attempts with a fixed pause in between. Only transient
//! failures are retried; once the budget is spent the caller gets a
//! `Retrieval` error naming the operation.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use ferroscreen_common::{RetrievalConfig, ScreenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 10, delay: Duration::from_secs(2) }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Result<Self, ScreenError> {
        if attempts == 0 {
            return Err(ScreenError::Validation("retry attempts must be a positive integer".into()));
        }
        Ok(Self { attempts, delay })
    }

    pub fn from_config(cfg: &RetrievalConfig) -> Result<Self, ScreenError> {
        Self::new(cfg.retry_attempts, cfg.retry_delay())
    }

    /// Single attempt, no pause.
    pub fn none() -> Self {
        Self { attempts: 1, delay: Duration::ZERO }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, ScreenError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScreenError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.attempts => {
                    return Err(ScreenError::Retrieval(format!(
                        "{operation} failed after {} attempts: {e}",
                        self.attempts
                    )));
                }
                Err(e) => {
                    warn!(operation, attempt, max_attempts = self.attempts, error = %e, "Transient failure, retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO).unwrap()
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast(5)
            .run("fetch", || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ScreenError::Retrieval("503".into()))
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_is_retrieval_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(3)
            .run("fetch targets", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ScreenError::Retrieval("timeout".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, ScreenError::Retrieval(_)));
        assert!(err.to_string().contains("fetch targets failed after 3 attempts"));
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(10)
            .run("fetch", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ScreenError::Security("blocked".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ScreenError::Security(_)));
    }

    #[test]
    fn test_none_policy_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = tokio_test::block_on(RetryPolicy::none().run("fetch", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ScreenError::Retrieval("503".into()))
        }))
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("after 1 attempts"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(matches!(RetryPolicy::new(0, Duration::ZERO), Err(ScreenError::Validation(_))));
    }

    #[test]
    fn test_defaults_match_config() {
        let policy = RetryPolicy::from_config(&RetrievalConfig::default()).unwrap();
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.attempts(), 10);
        assert_eq!(policy.delay(), Duration::from_secs(2));
    }
}
