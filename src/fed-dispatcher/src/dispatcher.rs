//! The `Federator` service implementation (`spec.md §4.5`): the inbound
//! auth pipeline followed by the read/filter/emit loop. Adapted from the
//! corpus's `GrpcServer::forward_bidi_stream`, which drives an
//! `async_stream::stream!` generator with `tokio::select!` against
//! cancellation — here simplified to a request/response-stream RPC rather
//! than a bidirectional one.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use tokio::time::Instant;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use fed_wire::pb::{Batch, Chunk as PbChunk, FileStreamRequest, TopicRequest};
use fed_wire::Federator;

use crate::auth::AuthInterceptor;
use crate::authorise::AuthorisationInterceptor;
use crate::encoder::BatchEncoder;
use crate::filter::AttributeFilter;
use crate::source::{EventSource, FileSource, ReadOutcome};

/// Between-poll sleep when the source has nothing new, so the emission
/// loop doesn't busy-spin while waiting out the idle timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct DispatcherConfig {
    pub idle_timeout: Duration,
    pub call_timeout: Duration,
    pub shared_headers: HashSet<String>,
    pub file_chunk_size: usize,
    pub s3_bucket: String,
    pub azure_account: String,
}

pub struct Dispatcher {
    source: Arc<dyn EventSource>,
    file_source: Arc<dyn FileSource>,
    auth: Arc<AuthInterceptor>,
    authz: Arc<AuthorisationInterceptor>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn EventSource>,
        file_source: Arc<dyn FileSource>,
        auth: Arc<AuthInterceptor>,
        authz: Arc<AuthorisationInterceptor>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            source,
            file_source,
            auth,
            authz,
            config,
        }
    }
}

#[tonic::async_trait]
impl Federator for Dispatcher {
    type StreamTopicStream = fed_wire::ResponseStream<Batch>;
    type StreamFileStream = fed_wire::ResponseStream<PbChunk>;

    async fn stream_topic(
        &self,
        request: Request<TopicRequest>,
    ) -> Result<Response<Self::StreamTopicStream>, Status> {
        let azp = self.auth.authenticate(request.metadata()).await?;
        let req = request.into_inner();
        let requirements = self.authz.authorise(&req.topic, &azp).await?;
        info!(azp, topic = %req.topic, offset = req.offset, "stream_topic accepted");

        let filter = AttributeFilter::new(requirements);
        let encoder = BatchEncoder::new(self.config.shared_headers.clone());
        let source = Arc::clone(&self.source);
        let idle_timeout = self.config.idle_timeout;
        let call_timeout = self.config.call_timeout;
        let topic = req.topic;
        let mut offset = req.offset;

        let output = stream! {
            let deadline = tokio::time::sleep(call_timeout);
            tokio::pin!(deadline);
            let mut last_productive = Instant::now();
            loop {
                tokio::select! {
                    biased;
                    _ = &mut deadline => {
                        yield Err(Status::deadline_exceeded("stream call deadline exceeded"));
                        break;
                    }
                    outcome = source.read_after(&topic, offset) => {
                        match outcome {
                            ReadOutcome::Record(record) => {
                                last_productive = Instant::now();
                                offset = record.offset + 1;
                                if filter.allows(&record) {
                                    yield Ok(encoder.encode(record));
                                }
                            }
                            ReadOutcome::Empty => {
                                if last_productive.elapsed() >= idle_timeout {
                                    break;
                                }
                                tokio::time::sleep(POLL_INTERVAL).await;
                            }
                            ReadOutcome::OutOfRange => {
                                yield Err(Status::out_of_range(format!(
                                    "offset {offset} on {topic} is behind retention"
                                )));
                                break;
                            }
                        }
                    }
                }
            }
        };
        Ok(Response::new(Box::pin(output)))
    }

    async fn stream_file(
        &self,
        request: Request<FileStreamRequest>,
    ) -> Result<Response<Self::StreamFileStream>, Status> {
        let azp = self.auth.authenticate(request.metadata()).await?;
        let req = request.into_inner();
        self.authz.authorise(&req.topic, &azp).await?;

        let file_source = Arc::clone(&self.file_source);
        let chunk_size = self.config.file_chunk_size;
        let s3_bucket = self.config.s3_bucket.clone();
        let azure_account = self.config.azure_account.clone();
        let topic = req.topic;
        let start_sequence_id = req.start_sequence_id;

        let Some(transfer) = file_source.resolve(&topic, start_sequence_id).await else {
            return Err(Status::not_found(format!(
                "no file transfer available for {topic} at or after sequence {start_sequence_id}"
            )));
        };

        let output = stream! {
            let provider = fed_files::provider_for(transfer.source_kind, &s3_bucket, &azure_account);
            let streamer = fed_files::FileStreamer::new(chunk_size);
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let emit = move |chunk: fed_types::Chunk| -> Result<(), fed_ore::FederatorError> {
                tx.send(chunk).map_err(|_| fed_ore::FederatorError::Cancelled("receiver dropped".into()))
            };
            let stream_task = tokio::spawn(async move {
                streamer.stream(&transfer, provider.as_ref(), emit).await
            });
            while let Some(chunk) = rx.recv().await {
                yield Ok(chunk.into());
            }
            if let Ok(Err(e)) = stream_task.await {
                warn!(error = %e, "file streaming failed");
                yield Err(Status::internal(e.to_string()));
            }
        };
        Ok(Response::new(Box::pin(output)))
    }
}
