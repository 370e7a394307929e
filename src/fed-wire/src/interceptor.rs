//! Request interceptors. Adapted from the corpus's
//! `VersionAttachInterceptor`/`VersionCheckExactInterceptor` pair: the
//! client-side interceptor stamps metadata onto every outbound request, the
//! server-side interceptor rejects requests missing it. `Interceptor::call`
//! is synchronous, so the actual bearer-token *verification* (which needs
//! an async JWKS fetch) happens in `fed-dispatcher`'s auth layer; this
//! interceptor only does the cheap, synchronous "is a token present" check.

use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Attaches a bearer token to the `authorization` metadata of every request
/// issued through the channel it wraps.
#[derive(Clone)]
pub struct BearerAttachInterceptor {
    header: MetadataValue<Ascii>,
}

impl BearerAttachInterceptor {
    pub fn new(token: &str) -> Result<Self, Status> {
        let header = format!("Bearer {token}")
            .parse()
            .map_err(|_| Status::invalid_argument("token is not a valid header value"))?;
        Ok(Self { header })
    }
}

impl Interceptor for BearerAttachInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert("authorization", self.header.clone());
        Ok(request)
    }
}

/// Rejects requests that carry no `authorization` metadata at all. A thin,
/// synchronous first line of defence before the dispatcher's async
/// `AuthInterceptor` validates the token's signature and claims.
#[derive(Clone, Default)]
pub struct RequireBearerInterceptor;

impl Interceptor for RequireBearerInterceptor {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        if request.metadata().get("authorization").is_none() {
            return Err(Status::unauthenticated("missing authorization metadata"));
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_bearer_header() {
        let mut interceptor = BearerAttachInterceptor::new("abc123").unwrap();
        let request = interceptor.call(Request::new(())).unwrap();
        let value = request.metadata().get("authorization").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc123");
    }

    #[test]
    fn rejects_request_without_authorization() {
        let mut interceptor = RequireBearerInterceptor;
        assert!(interceptor.call(Request::new(())).is_err());
    }
}
