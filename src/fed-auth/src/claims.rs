//! JWT claim shapes and unverified decoding (used to read `azp` before the
//! signature has necessarily been checked, e.g. to pick the right JWKS
//! key).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub exp: i64,
    #[serde(default)]
    pub iss: String,
    pub aud: AudienceClaim,
    #[serde(default, alias = "client_id")]
    pub azp: String,
    #[serde(default)]
    pub kid: Option<String>,
}

/// `aud` may be a single string or an array in different IdPs; normalise to
/// a list for comparison.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AudienceClaim {
    Single(String),
    Many(Vec<String>),
}

impl AudienceClaim {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            AudienceClaim::Single(s) => s == expected,
            AudienceClaim::Many(v) => v.iter().any(|s| s == expected),
        }
    }
}

/// Decodes the JWT payload without checking the signature. Returns an empty
/// `azp` on any malformed input, per `spec.md §4.2`'s `extractClientId`
/// contract ("blank on malformed").
pub fn extract_client_id(token: &str) -> String {
    decode_unverified(token)
        .map(|c| c.azp)
        .unwrap_or_default()
}

pub fn decode_header_kid(token: &str) -> Option<String> {
    use base64::Engine;
    let header_b64 = token.split('.').next()?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("kid")?.as_str().map(|s| s.to_string())
}

fn decode_unverified(token: &str) -> Option<Claims> {
    use base64::Engine;
    let payload_b64 = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}
