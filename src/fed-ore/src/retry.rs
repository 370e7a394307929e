//! Exponential backoff with jitter, shared by every outbound call in the
//! resilience envelope (`spec.md §4.9`).

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// State passed to the retried closure on each attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryState {
    pub attempt: u32,
    /// The backoff that will be slept before the *next* attempt, or `None`
    /// if this was the last permitted attempt.
    pub next_backoff: Option<Duration>,
}

/// A retry policy: exponential backoff from `initial_backoff` to
/// `max_backoff`, doubling each attempt, with up to `max_attempts` tries.
#[derive(Debug, Clone)]
pub struct Retry {
    initial_backoff: Duration,
    max_backoff: Duration,
    max_attempts: u32,
    jitter: bool,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(900),
            max_attempts: 10,
            jitter: false,
        }
    }
}

impl Retry {
    pub fn initial_backoff(mut self, d: Duration) -> Self {
        self.initial_backoff = d;
        self
    }

    pub fn clamp_backoff(mut self, d: Duration) -> Self {
        self.max_backoff = d;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// `spec.md §4.6`'s worker retry policy: base 500ms, cap 60s, doubling,
    /// jittered, unbounded attempts (the scheduler, not this policy, decides
    /// when to give up).
    pub fn worker_default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            max_attempts: u32::MAX,
            jitter: true,
        }
    }

    fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.initial_backoff.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = exp.min(self.max_backoff);
        if self.jitter {
            let millis = capped.as_millis().max(1) as u64;
            let jittered = rand::thread_rng().gen_range(0..=millis);
            Duration::from_millis(jittered)
        } else {
            capped
        }
    }

    /// Retries `f` until it returns `Ok`, attempts are exhausted, or `f`
    /// returns an error not worth retrying (signalled by the caller simply
    /// not calling this at all for non-retryable kinds — this helper always
    /// retries every `Err`).
    pub async fn retry_async<F, Fut, T, E>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut(RetryState) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            let next_backoff = if attempt + 1 < self.max_attempts {
                Some(self.backoff_for_attempt(attempt))
            } else {
                None
            };
            let state = RetryState {
                attempt,
                next_backoff,
            };
            match f(state).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    match next_backoff {
                        Some(d) => tokio::time::sleep(d).await,
                        None => return Err(e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let attempts = AtomicU32::new(0);
        let retry = Retry::default().initial_backoff(Duration::from_millis(1));
        let result: Result<(), &str> = retry
            .retry_async(|_state| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("not yet")
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let attempts = AtomicU32::new(0);
        let retry = Retry::default()
            .initial_backoff(Duration::from_millis(1))
            .max_attempts(3);
        let result: Result<(), &str> = retry
            .retry_async(|_state| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async move { Err("always fails") }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
