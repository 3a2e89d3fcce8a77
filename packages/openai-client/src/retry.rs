//! Bounded retry for transient API failures.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;

/// Exponential backoff policy applied to every request the client sends.
///
/// Only errors for which [`OpenAIError::is_transient`] is true are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retries.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub initial_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt.
    pub exp_base: f64,

    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            exp_base: 7.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set the number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.exp_base.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// Sum of every back-off sleep when all attempts fail.
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts).map(|attempt| self.delay_after(attempt)).sum()
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<F, Fut, T>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient OpenAI failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpenAIError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(7));
        assert_eq!(policy.delay_after(3), Duration::from_secs(30));
    }

    #[test]
    fn test_total_delay() {
        assert_eq!(RetryPolicy::default().total_delay(), Duration::from_secs(68));
        assert_eq!(RetryPolicy::none().total_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let policy = RetryPolicy::default().with_initial_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = policy
            .run("test", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(OpenAIError::Api {
                        status: 503,
                        message: "busy".into(),
                    })
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let policy = RetryPolicy::default().with_initial_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<()> = policy
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(OpenAIError::Api {
                    status: 401,
                    message: "unauthorized".into(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::default()
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<()> = policy
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(OpenAIError::Network("reset".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
