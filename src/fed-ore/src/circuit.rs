//! Circuit breaker half of the resilience envelope (`spec.md §4.9`).
//!
//! Ordering is circuit-breaker wraps retry wraps the call: [`CircuitBreaker::call`]
//! is meant to wrap a closure that itself runs a [`crate::retry::Retry`] loop.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
}

/// Failure-rate threshold default 50% over a sliding window of 10, minimum
/// 20 calls before tripping; open state lasts 60s; half-open permits 1
/// trial (`spec.md §4.9` defaults).
pub struct CircuitBreaker {
    window_size: usize,
    min_calls: usize,
    failure_rate_threshold: f64,
    open_duration: Duration,
    inner: Mutex<Inner>,
}

/// Returned when the breaker is open and a call is rejected without being
/// attempted.
#[derive(Debug, thiserror::Error)]
#[error("circuit breaker open")]
pub struct CircuitOpen;

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(10, 20, 0.5, Duration::from_secs(60))
    }
}

impl CircuitBreaker {
    pub fn new(
        window_size: usize,
        min_calls: usize,
        failure_rate_threshold: f64,
        open_duration: Duration,
    ) -> Self {
        Self {
            window_size,
            min_calls,
            failure_rate_threshold,
            open_duration,
            inner: Mutex::new(Inner {
                state: State::Closed,
                window: VecDeque::with_capacity(window_size),
                opened_at: None,
            }),
        }
    }

    /// Runs `f` unless the breaker is open, in which case it fails fast with
    /// [`CircuitOpen`] without invoking `f` at all.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitCallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if !self.permit().await {
            return Err(CircuitCallError::Open(CircuitOpen));
        }
        match f().await {
            Ok(v) => {
                self.record(true).await;
                Ok(v)
            }
            Err(e) => {
                self.record(false).await;
                Err(CircuitCallError::Inner(e))
            }
        }
    }

    async fn permit(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            State::Closed => true,
            State::HalfOpen => false, // a trial is already in flight elsewhere
            State::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.open_duration {
                    inner.state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    async fn record(&self, success: bool) {
        let mut inner = self.inner.lock().await;
        if inner.state == State::HalfOpen {
            if success {
                inner.state = State::Closed;
                inner.window.clear();
            } else {
                inner.state = State::Open;
                inner.opened_at = Some(Instant::now());
            }
            return;
        }

        inner.window.push_back(success);
        if inner.window.len() > self.window_size {
            inner.window.pop_front();
        }
        if inner.window.len() >= self.min_calls {
            let failures = inner.window.iter().filter(|s| !**s).count();
            let rate = failures as f64 / inner.window.len() as f64;
            if rate >= self.failure_rate_threshold {
                inner.state = State::Open;
                inner.opened_at = Some(Instant::now());
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitCallError<E> {
    #[error(transparent)]
    Open(#[from] CircuitOpen),
    #[error(transparent)]
    Inner(E),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trips_after_threshold_failures_in_window() {
        let breaker = CircuitBreaker::new(10, 4, 0.5, Duration::from_secs(60));
        for _ in 0..4 {
            let _ = breaker
                .call(|| async { Err::<(), _>("boom") })
                .await;
        }
        let result = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitCallError::Open(_))));
    }

    #[tokio::test]
    async fn stays_closed_below_min_calls() {
        let breaker = CircuitBreaker::new(10, 20, 0.5, Duration::from_secs(60));
        for _ in 0..5 {
            let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        }
        let result = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(result.is_ok());
    }
}
