//! `ClientWorker` (`spec.md §4.6`): one task per `(peer, topic)`. Loads the
//! cursor, opens a long-lived stream from the peer starting at that cursor,
//! publishes every batch locally, and persists the cursor after each
//! successful publish — never before.
//!
//! Transient failures (network, peer temporarily unavailable) retry the
//! whole connect-and-stream cycle with the shared exponential backoff; the
//! reloaded cursor on each attempt means no already-published record is
//! re-delivered. Non-transient failures stop the worker for the scheduler
//! to report upward.

use std::sync::Arc;
use std::time::Duration;

use fed_auth::TokenClient;
use fed_ore::{classify_status, FederatorError, Retry, StreamOutcome};
use fed_types::{Cursor, CursorKey, JobSpec, Record};
use fed_wire::pb::TopicRequest;

use crate::cursor_store::CursorStore;
use crate::publisher::LocalPublisher;

/// How [`ClientWorker::run`] concluded, for the scheduler to act on.
#[derive(Debug)]
pub enum WorkerOutcome {
    /// Idle timeout, or the peer reported end-of-stream; the scheduler
    /// relaunches this job on its next tick.
    Idle,
    /// A non-transient error; the scheduler surfaces it rather than
    /// relaunching blindly.
    Fatal(FederatorError),
}

pub struct ClientWorker {
    spec: JobSpec,
    tokens: Arc<TokenClient>,
    cursor_store: Arc<dyn CursorStore>,
    publisher: Arc<dyn LocalPublisher>,
    idle_timeout: Duration,
}

impl ClientWorker {
    pub fn new(
        spec: JobSpec,
        tokens: Arc<TokenClient>,
        cursor_store: Arc<dyn CursorStore>,
        publisher: Arc<dyn LocalPublisher>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            spec,
            tokens,
            cursor_store,
            publisher,
            idle_timeout,
        }
    }

    fn cursor_key(&self) -> CursorKey {
        CursorKey::new(self.spec.peer_id.clone(), self.spec.topic.clone())
    }

    /// Drives the connect-stream-publish cycle, retrying transient
    /// failures with `spec.md §4.6`'s backoff until an idle timeout,
    /// clean end-of-stream, or a non-transient failure.
    pub async fn run(&self) -> WorkerOutcome {
        let retry = Retry::worker_default();
        let result: Result<WorkerOutcome, FederatorError> =
            retry.retry_async(|_state| self.try_once()).await;
        result.unwrap_or_else(WorkerOutcome::Fatal)
    }

    /// One connect-and-stream attempt. `Err` signals a transient failure
    /// the caller should retry; `Ok` is a terminal [`WorkerOutcome`].
    async fn try_once(&self) -> Result<WorkerOutcome, FederatorError> {
        let cursor = self.cursor_store.load(&self.cursor_key()).await?;
        let token = self.tokens.current().await?;
        let mut client =
            fed_wire::dial(&self.spec.peer_endpoint, self.spec.peer_tls, &token.raw).await?;

        let request = tonic::Request::new(TopicRequest {
            topic: self.spec.topic.clone(),
            offset: cursor.offset(),
        });
        let mut stream = match client.stream_topic(request).await {
            Ok(response) => response.into_inner(),
            Err(status) => return self.classify(&status),
        };

        loop {
            let next = tokio::time::timeout(self.idle_timeout, stream.message()).await;
            let message = match next {
                Err(_elapsed) => {
                    tracing::info!(topic = %self.spec.topic, "idle timeout, closing stream cleanly");
                    return Ok(WorkerOutcome::Idle);
                }
                Ok(Ok(message)) => message,
                Ok(Err(status)) => return self.classify(&status),
            };
            let Some(batch) = message else {
                return Ok(WorkerOutcome::Idle);
            };

            let offset = batch.offset;
            let record: Record = batch.into();
            self.publisher.publish(&record).await?;
            self.cursor_store
                .store(&self.cursor_key(), Cursor::after(offset))
                .await?;
        }
    }

    fn classify(&self, status: &tonic::Status) -> Result<WorkerOutcome, FederatorError> {
        match classify_status(status) {
            StreamOutcome::EndOfStream => Ok(WorkerOutcome::Idle),
            StreamOutcome::Retryable => Err(FederatorError::transient(status.message().to_string())),
            StreamOutcome::Fatal => Ok(WorkerOutcome::Fatal(FederatorError::Authorisation(
                status.message().to_string(),
            ))),
        }
    }
}
