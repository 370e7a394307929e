//! Internal utility library for the Federator: error taxonomy, resilience
//! envelope, tracing bootstrap, task-spawn helpers.
//!
//! Kept deliberately small and dependency-light, in the spirit of the
//! corpus's own internal-utilities crate: anything here is an extension of
//! the stdlib or of `tokio`/`tracing`, not a place to grow feature logic.

pub mod circuit;
pub mod error;
pub mod logging;
pub mod resilience;
pub mod retry;
pub mod task;

pub use error::{classify_status, FederatorError, StreamOutcome};
pub use resilience::Envelope;
pub use retry::{Retry, RetryState};
pub use task::{spawn, AbortOnDropHandle, JoinHandleExt};
