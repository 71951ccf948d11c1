use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff for fallible async operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first. 0 behaves like 1.
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay after failed try number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `op` until it succeeds or the attempts are used up. The last
    /// error is returned with context naming `what`.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        what,
                        attempt,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.context(format!("{} failed after {} attempts", what, attempts))),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 4,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(16));
        assert_eq!(policy.delay_after(5), Duration::from_secs(30));
        assert_eq!(policy.delay_after(90), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let calls = AtomicU32::new(0);
        let value = fast(5)
            .run("flaky", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(anyhow!("not yet"))
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(3)
            .run("doomed", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("down"))
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("doomed failed after 3 attempts"));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _ = fast(0)
            .run("once", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow!("down"))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
