//! The wire protocol (`spec.md §6`): generated protobuf/gRPC types plus the
//! generic transport scaffolding shared by the producer and consumer
//! binaries. Adapted from the bidirectional gRPC transport in the corpus's
//! compute-client `grpc` module, simplified for this protocol's
//! request/response-stream RPCs (one request, many responses) rather than a
//! fully bidirectional channel.

pub mod convert;
pub mod interceptor;
pub mod transport;

pub mod pb {
    tonic::include_proto!("federator.v1");
}

pub use interceptor::{BearerAttachInterceptor, RequireBearerInterceptor};
pub use pb::federator_client::FederatorClient;
pub use pb::federator_server::{Federator, FederatorServer};
pub use pb::{Batch, Chunk, FileStreamRequest, HeaderEntry, TopicRequest};
pub use transport::{dial, serve, BearerChannel, ResponseStream};
