//! The shared envelope from `spec.md §4.9`: circuit-breaker wraps retry
//! wraps the call.

use std::future::Future;

use crate::circuit::{CircuitBreaker, CircuitCallError};
use crate::retry::Retry;

/// Bundles a [`Retry`] policy and a [`CircuitBreaker`] in the mandated
/// order, so call sites (`fed-auth`, `fed-policy`, `fed-worker`) don't each
/// re-decide how the two compose.
pub struct Envelope {
    pub retry: Retry,
    pub breaker: CircuitBreaker,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            retry: Retry::default(),
            breaker: CircuitBreaker::default(),
        }
    }
}

impl Envelope {
    pub fn new(retry: Retry, breaker: CircuitBreaker) -> Self {
        Self { retry, breaker }
    }

    /// Runs `f` under the circuit breaker, retrying transient failures
    /// inside each breaker-permitted attempt.
    pub async fn call<F, Fut, T, E>(&self, mut f: F) -> Result<T, CircuitCallError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.breaker
            .call(|| self.retry.retry_async(|_state| f()))
            .await
    }
}
