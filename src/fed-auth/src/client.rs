//! `TokenClient`: obtains, validates, and refreshes a bearer token from the
//! identity provider (`spec.md §4.2`).

use std::time::{Duration, SystemTime};

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, DecodingKey, Validation};
use reqwest::Identity;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use fed_ore::FederatorError;
use fed_types::BearerToken;

use crate::claims::{decode_header_kid, extract_client_id, Claims};

/// Static configuration for a [`TokenClient`], drawn from the `idp.*`
/// configuration surface (`spec.md §6`).
#[derive(Debug, Clone)]
pub struct TokenClientConfig {
    pub token_url: String,
    pub jwks_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub mtls_enabled: bool,
    pub keystore_path: Option<String>,
    pub keystore_password: Option<String>,
    pub audience: String,
    pub refresh_buffer: Duration,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    300
}

/// Obtains, validates, and refreshes a bearer token. A single instance
/// holds the current token behind a read-through accessor
/// ([`TokenClient::current`]); [`crate::refresher::spawn_refresher`] drives
/// proactive refresh in the background.
pub struct TokenClient {
    config: TokenClientConfig,
    http: reqwest::Client,
    jwks: RwLock<Option<JwkSet>>,
    jwks_single_flight: Mutex<()>,
    current: RwLock<Option<BearerToken>>,
}

impl TokenClient {
    /// Builds the underlying HTTP client. In mTLS mode the client presents a
    /// PKCS#12 identity and the eventual token request carries no secret;
    /// in client-secret mode, the client id/secret travel in the request
    /// body over plain TLS. Mirrors the identity-attachment pattern used to
    /// build schema-registry clients in the corpus.
    pub fn new(config: TokenClientConfig) -> Result<Self, FederatorError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if config.mtls_enabled {
            let path = config.keystore_path.as_deref().ok_or_else(|| {
                FederatorError::Configuration("idp.mtls.enabled requires idp.keystore.path".into())
            })?;
            let bytes = std::fs::read(path)
                .map_err(|e| FederatorError::Configuration(format!("reading keystore {path}: {e}")))?;
            let password = config.keystore_password.as_deref().unwrap_or_default();
            let identity = Identity::from_pkcs12_der(&bytes, password)
                .map_err(|e| FederatorError::Configuration(format!("invalid keystore {path}: {e}")))?;
            builder = builder.identity(identity);
        }
        let http = builder
            .build()
            .map_err(|e| FederatorError::Configuration(e.to_string()))?;
        Ok(Self {
            config,
            http,
            jwks: RwLock::new(None),
            jwks_single_flight: Mutex::new(()),
            current: RwLock::new(None),
        })
    }

    /// Performs a token request against the identity provider
    /// (`client_credentials` grant).
    pub async fn fetch(&self) -> Result<BearerToken, FederatorError> {
        let mut form = vec![("grant_type", "client_credentials")];
        if !self.config.mtls_enabled {
            form.push(("client_id", self.config.client_id.as_str()));
            if let Some(secret) = &self.config.client_secret {
                form.push(("client_secret", secret.as_str()));
            }
        }
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| FederatorError::transient(format!("token request failed: {e}")))?;

        if response.status().is_server_error() {
            return Err(FederatorError::transient(format!(
                "identity provider returned {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(FederatorError::Authentication(format!(
                "identity provider rejected token request: {}",
                response.status()
            )));
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| FederatorError::Authentication(format!("malformed token response: {e}")))?;

        let subject = extract_client_id(&body.access_token);
        let token = BearerToken {
            raw: body.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(body.expires_in),
            audience: self.config.audience.clone(),
            subject,
        };
        *self.current.write().await = Some(token.clone());
        Ok(token)
    }

    /// Read-through accessor: returns the current token if it is still
    /// fresh, else fetches a new one.
    pub async fn current(&self) -> Result<BearerToken, FederatorError> {
        if let Some(token) = self.current.read().await.clone() {
            if !self.should_refresh(&token) {
                return Ok(token);
            }
        }
        self.fetch().await
    }

    pub fn should_refresh(&self, token: &BearerToken) -> bool {
        token.should_refresh(SystemTime::now(), self.config.refresh_buffer)
    }

    /// Parses `token`, checks its signature against the identity provider's
    /// published signing keys, and checks `exp`/`aud`/`iss`.
    pub async fn verify(&self, token: &str) -> bool {
        self.try_verify(token).await.is_ok()
    }

    async fn try_verify(&self, token: &str) -> Result<Claims, FederatorError> {
        let kid = decode_header_kid(token);
        let key = self.decoding_key(kid.as_deref(), false).await?;
        let claims = self.decode_with_key(token, &key)?;
        if !claims.aud.contains(&self.config.audience) {
            return Err(FederatorError::Authentication(
                "token audience mismatch".into(),
            ));
        }
        Ok(claims)
    }

    fn decode_with_key(&self, token: &str, key: &DecodingKey) -> Result<Claims, FederatorError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_aud = false; // checked separately against configured audience
        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| FederatorError::Authentication(format!("invalid token: {e}")))
    }

    async fn decoding_key(&self, kid: Option<&str>, forced: bool) -> Result<DecodingKey, FederatorError> {
        self.ensure_jwks(forced).await?;
        let jwks = self.jwks.read().await;
        let jwks = jwks.as_ref().ok_or_else(|| {
            FederatorError::transient("jwks not yet loaded")
        })?;
        let jwk = match kid {
            Some(kid) => jwks.find(kid),
            None => jwks.keys.first(),
        };
        match jwk {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map_err(|e| FederatorError::Authentication(format!("unusable jwk: {e}"))),
            None if !forced => {
                // Tolerate key rotation: force exactly one refresh before failing.
                drop(jwks);
                Box::pin(self.decoding_key_forced(kid)).await
            }
            None => Err(FederatorError::Authentication(
                "no matching signing key".into(),
            )),
        }
    }

    async fn decoding_key_forced(&self, kid: Option<&str>) -> Result<DecodingKey, FederatorError> {
        self.decoding_key(kid, true).await
    }

    /// Fetches and caches the JWKS document, unless already cached and
    /// `force` is false. Refreshes are single-flighted.
    async fn ensure_jwks(&self, force: bool) -> Result<(), FederatorError> {
        if !force && self.jwks.read().await.is_some() {
            return Ok(());
        }
        let _guard = self.jwks_single_flight.lock().await;
        if !force && self.jwks.read().await.is_some() {
            return Ok(());
        }
        let response = self
            .http
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| FederatorError::transient(format!("jwks fetch failed: {e}")))?;
        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| FederatorError::transient(format!("malformed jwks: {e}")))?;
        *self.jwks.write().await = Some(jwks);
        Ok(())
    }

    pub fn extract_client_id(&self, token: &str) -> String {
        extract_client_id(token)
    }
}
