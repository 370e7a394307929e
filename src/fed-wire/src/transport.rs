//! Connection helpers. Adapted from the corpus's `GrpcClient::connect` /
//! `GrpcServer::serve`, simplified for plain TCP (the corpus also dials
//! Unix sockets for same-host replicas, which this protocol never does)
//! and for request/response-stream RPCs rather than a bidi channel.

use std::net::SocketAddr;
use std::pin::Pin;

use tonic::codegen::InterceptedService;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::Status;
use futures::Stream;

use fed_ore::FederatorError;

use crate::interceptor::{BearerAttachInterceptor, RequireBearerInterceptor};
use crate::pb::federator_client::FederatorClient;
use crate::pb::federator_server::{Federator, FederatorServer};

/// A server-streaming response, boxed so handlers can build it with
/// `async_stream::stream!` without naming the concrete generator type.
pub type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

pub type BearerChannel = InterceptedService<Channel, BearerAttachInterceptor>;

/// Dials `address`, optionally over TLS, and attaches `token` as a bearer
/// credential to every request the returned client issues.
pub async fn dial(
    address: &str,
    tls: bool,
    token: &str,
) -> Result<FederatorClient<BearerChannel>, FederatorError> {
    let scheme = if tls { "https" } else { "http" };
    let mut endpoint = Endpoint::new(format!("{scheme}://{address}"))
        .map_err(|e| FederatorError::Configuration(format!("invalid peer address {address}: {e}")))?;
    if tls {
        endpoint = endpoint
            .tls_config(ClientTlsConfig::new())
            .map_err(|e| FederatorError::Configuration(format!("tls setup for {address}: {e}")))?;
    }
    let channel = endpoint
        .connect()
        .await
        .map_err(|e| FederatorError::transient(format!("connecting to {address}: {e}")))?;
    let interceptor = BearerAttachInterceptor::new(token)
        .map_err(|e| FederatorError::Authentication(e.to_string()))?;
    Ok(FederatorClient::with_interceptor(channel, interceptor))
}

/// Serves `service` (the dispatcher's [`Federator`] implementation) on
/// `listen_addr`, rejecting any request with no `authorization` metadata
/// before it reaches the service.
pub async fn serve<S>(listen_addr: SocketAddr, service: S) -> Result<(), FederatorError>
where
    S: Federator,
{
    let service =
        InterceptedService::new(FederatorServer::new(service), RequireBearerInterceptor);
    tonic::transport::Server::builder()
        .add_service(service)
        .serve(listen_addr)
        .await
        .map_err(|e| FederatorError::transient(format!("grpc server failed: {e}")))
}
