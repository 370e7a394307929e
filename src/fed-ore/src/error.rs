//! The closed error taxonomy from `spec.md §7`, realised as a single enum
//! so every call site maps errors to gRPC status and retry behaviour the
//! same way.

use std::fmt;

use tonic::Status;

/// A Federator error, tagged with the kind that determines how it
/// propagates (`spec.md §7`).
#[derive(thiserror::Error, Debug)]
pub enum FederatorError {
    /// Missing/invalid property, unresolvable path, malformed policy JSON.
    /// Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network unavailable, identity provider 5xx, cursor store connection
    /// refused, transport reset. Retried by the resilience envelope.
    #[error("transient error: {0}")]
    Transient(String),

    /// Missing/expired/invalid token.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Token valid but caller not authorised for the product, or audience
    /// mismatch.
    #[error("authorisation error: {0}")]
    Authorisation(String),

    /// Unknown topic, malformed batch, out-of-range offset.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// File checksum or size mismatch.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Requested shutdown or reconciler removal. Not a failure.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl FederatorError {
    /// Whether the resilience envelope (`spec.md §4.9`) should retry this
    /// error kind.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FederatorError::Transient(_))
    }

    pub fn transient(msg: impl fmt::Display) -> Self {
        FederatorError::Transient(msg.to_string())
    }
}

impl From<&FederatorError> for Status {
    fn from(err: &FederatorError) -> Self {
        match err {
            FederatorError::Configuration(m) => Status::invalid_argument(m.clone()),
            FederatorError::Transient(m) => Status::unavailable(m.clone()),
            FederatorError::Authentication(m) => Status::unauthenticated(m.clone()),
            FederatorError::Authorisation(m) => Status::permission_denied(m.clone()),
            FederatorError::Protocol(m) => Status::invalid_argument(m.clone()),
            FederatorError::Integrity(m) => Status::internal(m.clone()),
            FederatorError::Cancelled(m) => Status::cancelled(m.clone()),
        }
    }
}

impl From<FederatorError> for Status {
    fn from(err: FederatorError) -> Self {
        Status::from(&err)
    }
}

/// Classifies a [`Status`] returned by a peer stream into the three buckets
/// `spec.md §4.6` cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// `OUT_OF_RANGE | CANCELLED | DEADLINE_EXCEEDED`: end of iteration, not
    /// an error.
    EndOfStream,
    /// Network, unavailable, auth temporarily unavailable: retry with
    /// backoff.
    Retryable,
    /// Invalid argument, permission denied: stop the job and report
    /// upward.
    Fatal,
}

pub fn classify_status(status: &Status) -> StreamOutcome {
    use tonic::Code::*;
    match status.code() {
        OutOfRange | Cancelled | DeadlineExceeded => StreamOutcome::EndOfStream,
        Unavailable | Unauthenticated | ResourceExhausted | Aborted | Internal => {
            StreamOutcome::Retryable
        }
        InvalidArgument | PermissionDenied | NotFound | FailedPrecondition => {
            StreamOutcome::Fatal
        }
        _ => StreamOutcome::Retryable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_is_end_of_stream() {
        assert_eq!(
            classify_status(&Status::out_of_range("past retention")),
            StreamOutcome::EndOfStream
        );
    }

    #[test]
    fn permission_denied_is_fatal() {
        assert_eq!(
            classify_status(&Status::permission_denied("nope")),
            StreamOutcome::Fatal
        );
    }

    #[test]
    fn unavailable_is_retryable() {
        assert_eq!(
            classify_status(&Status::unavailable("down")),
            StreamOutcome::Retryable
        );
    }
}
