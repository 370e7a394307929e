//! `AuthorisationInterceptor` (`spec.md §4.5` step 2): loads the producer
//! snapshot for this node and accepts the call iff the caller's `azp` is
//! authorised for the requested topic under any producer entry
//! (`DESIGN.md`'s resolution of the multi-producer open question).

use std::sync::Arc;

use tonic::Status;

use fed_config::cache::{CacheKind, ConfigCache};
use fed_ore::FederatorError;
use fed_policy::PolicyClient;
use fed_types::{AttributeRequirement, ConfigSnapshot};

pub struct AuthorisationInterceptor {
    cache: Arc<ConfigCache>,
    policy: Arc<PolicyClient>,
    /// The cache key this node's own snapshot is stored under (its client
    /// id with the policy service).
    node_client_id: String,
}

impl AuthorisationInterceptor {
    pub fn new(cache: Arc<ConfigCache>, policy: Arc<PolicyClient>, node_client_id: String) -> Self {
        Self {
            cache,
            policy,
            node_client_id,
        }
    }

    /// Returns the caller's attribute requirements for `topic` on success
    /// (possibly empty, meaning unconditional access), or `PERMISSION_DENIED`.
    pub async fn authorise(&self, topic: &str, azp: &str) -> Result<Vec<AttributeRequirement>, Status> {
        let snapshot = self.snapshot().await.map_err(Status::from)?;
        snapshot.requirements_for(topic, azp).ok_or_else(|| {
            Status::permission_denied(format!("{azp} is not authorised for topic {topic}"))
        })
    }

    async fn snapshot(&self) -> Result<Arc<ConfigSnapshot>, FederatorError> {
        if let Some(snapshot) = self.cache.get(CacheKind::Producer, &self.node_client_id) {
            return Ok(snapshot);
        }
        let fresh = self
            .policy
            .get_producer_config(Some(&self.node_client_id))
            .await?;
        self.cache
            .put(CacheKind::Producer, self.node_client_id.clone(), fresh);
        self.cache
            .get(CacheKind::Producer, &self.node_client_id)
            .ok_or_else(|| FederatorError::Transient("snapshot vanished immediately after insert".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fed_auth::{TokenClient, TokenClientConfig};
    use fed_types::ConfigKind;

    use super::*;

    const BODY: &str = r#"{
        "clientId": "node-x",
        "producers": [
            {
                "name": "peer-a", "idpClientId": "idp-a", "host": "peer-a.internal", "port": 8443,
                "tls": true, "active": true,
                "products": [
                    { "name": "orders-feed", "topic": "orders",
                      "consumers": [
                        { "name": "consumer-1", "idpClientId": "idp-1",
                          "attributes": [ { "name": "nationality", "value": "GBR" } ] }
                      ] }
                ]
            }
        ]
    }"#;

    fn interceptor() -> AuthorisationInterceptor {
        let tokens = Arc::new(
            TokenClient::new(TokenClientConfig {
                token_url: String::new(),
                jwks_url: String::new(),
                client_id: String::new(),
                client_secret: None,
                mtls_enabled: false,
                keystore_path: None,
                keystore_password: None,
                audience: String::new(),
                refresh_buffer: Duration::from_secs(30),
            })
            .unwrap(),
        );
        let cache = Arc::new(ConfigCache::new(8, Duration::from_secs(60)));
        let snapshot = ConfigSnapshot::parse(ConfigKind::Producer, BODY.as_bytes(), Duration::from_secs(60)).unwrap();
        cache.put(CacheKind::Producer, "node-x".to_string(), snapshot);
        let policy = Arc::new(PolicyClient::new("http://unused.invalid", tokens, Duration::from_secs(60)));
        AuthorisationInterceptor::new(cache, policy, "node-x".to_string())
    }

    // Scenario 5 (`spec.md §8`): an azp with no matching consumer grant is
    // denied, never reaching the policy service since the snapshot is
    // already cached.
    #[tokio::test]
    async fn unauthorised_azp_is_permission_denied() {
        let error = interceptor().authorise("orders", "UNLISTED").await.unwrap_err();
        assert_eq!(error.code(), tonic::Code::PermissionDenied);
    }

    #[tokio::test]
    async fn authorised_azp_returns_its_attribute_requirements() {
        let reqs = interceptor().authorise("orders", "idp-1").await.unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name(), "nationality");
    }
}
