//! `PolicyClient` (`spec.md §4.3`): fetches [`ConfigSnapshot`]s from the
//! central policy service over TLS, using a bearer token from `fed-auth`.
//! This client never caches — caching is `fed-config::ConfigCache`'s job.

use std::sync::Arc;
use std::time::Duration;

use fed_auth::TokenClient;
use fed_ore::FederatorError;
use fed_types::{ConfigKind, ConfigSnapshot};

pub struct PolicyClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<TokenClient>,
    snapshot_ttl: Duration,
}

impl PolicyClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenClient>, snapshot_ttl: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            tokens,
            snapshot_ttl,
        }
    }

    pub async fn get_producer_config(&self, id: Option<&str>) -> Result<ConfigSnapshot, FederatorError> {
        self.get(ConfigKind::Producer, "producer", "producer_id", id)
            .await
    }

    pub async fn get_consumer_config(&self, id: Option<&str>) -> Result<ConfigSnapshot, FederatorError> {
        self.get(ConfigKind::Consumer, "consumer", "consumer_id", id)
            .await
    }

    async fn get(
        &self,
        kind: ConfigKind,
        path_segment: &str,
        query_key: &str,
        id: Option<&str>,
    ) -> Result<ConfigSnapshot, FederatorError> {
        let token = self.tokens.current().await?;
        let mut request = self
            .http
            .get(format!("{}/configuration/{path_segment}", self.base_url))
            .bearer_auth(&token.raw);
        if let Some(id) = id {
            request = request.query(&[(query_key, id)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FederatorError::transient(format!("policy service unreachable: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(FederatorError::transient(format!(
                "policy service returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(FederatorError::Configuration(format!(
                "policy service rejected request: {status}"
            )));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| FederatorError::transient(format!("reading policy response: {e}")))?;
        ConfigSnapshot::parse(kind, &body, self.snapshot_ttl)
            .map_err(|e| FederatorError::Configuration(format!("malformed policy response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fed_auth::TokenClientConfig;

    fn token_client() -> Arc<TokenClient> {
        Arc::new(
            TokenClient::new(TokenClientConfig {
                token_url: "http://127.0.0.1:0/token".into(),
                jwks_url: "http://127.0.0.1:0/jwks".into(),
                client_id: "federator".into(),
                client_secret: Some("secret".into()),
                mtls_enabled: false,
                keystore_path: None,
                keystore_password: None,
                audience: "federator".into(),
                refresh_buffer: Duration::from_secs(30),
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn unreachable_policy_service_is_transient() {
        let client = PolicyClient::new("http://127.0.0.1:0", token_client(), Duration::from_secs(30));
        let err = client.get_producer_config(None).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
