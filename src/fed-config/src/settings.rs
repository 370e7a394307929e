//! The explicit, immutable startup configuration value (`spec.md §9`
//! design note: replace the global property registry with a `Config`
//! value constructed once and passed explicitly).
//!
//! Recognised properties mirror the surface table in `spec.md §6`.

use std::time::Duration;

use serde::Deserialize;

fn secs(d: u64) -> Duration {
    Duration::from_secs(d)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub idle_timeout_secs: u64,
    pub keep_alive_time_secs: u64,
    pub keep_alive_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 60,
            keep_alive_time_secs: 30,
            keep_alive_timeout_secs: 10,
        }
    }
}

impl ClientSettings {
    pub fn idle_timeout(&self) -> Duration {
        secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub stream_chunk_size: u64,
    pub temp_dir: Option<String>,
    pub storage_provider: StorageProviderKind,
    pub s3_bucket: String,
    pub azure_account: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            stream_chunk_size: 1000, // small by design; spec.md §4.7
            temp_dir: None,
            storage_provider: StorageProviderKind::Local,
            s3_bucket: String::new(),
            azure_account: String::new(),
        }
    }
}

impl FileSettings {
    pub fn temp_dir(&self) -> std::path::PathBuf {
        match &self.temp_dir {
            Some(dir) => std::path::PathBuf::from(dir),
            None => std::env::temp_dir().join("federator-files"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageProviderKind {
    Local,
    S3,
    Azure,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdpSettings {
    pub mtls_enabled: bool,
    pub token_url: String,
    pub jwks_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub keystore_path: Option<String>,
    pub keystore_password: Option<String>,
    pub truststore_path: Option<String>,
    pub truststore_password: Option<String>,
    pub audience: String,
    pub refresh_buffer_secs: u64,
}

impl Default for IdpSettings {
    fn default() -> Self {
        Self {
            mtls_enabled: false,
            token_url: String::new(),
            jwks_url: String::new(),
            client_id: String::new(),
            client_secret: None,
            keystore_path: None,
            keystore_password: None,
            truststore_path: None,
            truststore_password: None,
            audience: "federator".to_string(),
            refresh_buffer_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_millis: u64,
    pub max_backoff_millis: u64,
    pub forever: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_millis: 200,
            max_backoff_millis: 900_000,
            forever: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResilienceSettings {
    pub window_size: usize,
    pub min_calls: usize,
    pub failure_rate_threshold: f64,
    pub open_duration_secs: u64,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_calls: 20,
            failure_rate_threshold: 0.5,
            open_duration_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub share_all: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self { share_all: false }
    }
}

/// The producer's hard server-side deadline per inbound stream call
/// (`spec.md §4.5`'s `TimeoutInterceptor`); not named in `spec.md §6`'s
/// configuration surface table, so it is sourced here as an ambient knob.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    pub call_timeout_secs: u64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self { call_timeout_secs: 3600 }
    }
}

impl DispatcherSettings {
    pub fn call_timeout(&self) -> Duration {
        secs(self.call_timeout_secs)
    }
}

/// Per-job scheduling defaults applied by the reconciler (`spec.md §4.4`);
/// the policy schema carries no per-product schedule or retry count.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub schedule: String,
    pub retry_count: u32,
    pub run_immediately: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            schedule: "* * * * * *".to_string(),
            retry_count: 3,
            run_immediately: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FederatorConfig {
    pub node_id: String,
    pub listen_addr: String,
    pub policy_service_url: String,
    pub reload_interval_secs: u64,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub log_filter: String,
    /// `^`-separated list of headers to forward (`spec.md §6`).
    pub shared_headers: String,
    pub client: ClientSettings,
    pub file: FileSettings,
    pub idp: IdpSettings,
    pub retries: RetrySettings,
    pub resilience: ResilienceSettings,
    pub filter: FilterSettings,
    pub dispatcher: DispatcherSettings,
    pub job: JobSettings,
}

impl Default for FederatorConfig {
    fn default() -> Self {
        Self {
            node_id: "local".to_string(),
            listen_addr: "0.0.0.0:8443".to_string(),
            policy_service_url: String::new(),
            reload_interval_secs: 30,
            cache_capacity: 256,
            cache_ttl_secs: 60,
            log_filter: "info".to_string(),
            shared_headers: String::new(),
            client: ClientSettings::default(),
            file: FileSettings::default(),
            idp: IdpSettings::default(),
            retries: RetrySettings::default(),
            resilience: ResilienceSettings::default(),
            filter: FilterSettings::default(),
            dispatcher: DispatcherSettings::default(),
            job: JobSettings::default(),
        }
    }
}

impl FederatorConfig {
    pub fn shared_header_set(&self) -> Vec<String> {
        self.shared_headers
            .split('^')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Loads configuration from an optional file (TOML or JSON, by
    /// extension) layered under defaults, then overridden by `FED_`-prefixed
    /// environment variables. A missing/invalid path or malformed file is a
    /// `Configuration` error, fatal at startup (`spec.md §7`).
    pub fn load(path: Option<&str>) -> Result<Self, fed_ore::FederatorError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path));
        }
        builder = builder.add_source(::config::Environment::with_prefix("FED").separator("__"));
        let built = builder.build().map_err(cfg_err)?;
        built.try_deserialize().map_err(cfg_err)
    }
}

fn cfg_err(e: impl std::fmt::Display) -> fed_ore::FederatorError {
    fed_ore::FederatorError::Configuration(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = FederatorConfig::load(None).unwrap();
        assert_eq!(cfg.file.stream_chunk_size, 1000);
        assert_eq!(cfg.client.idle_timeout_secs, 60);
    }

    #[test]
    fn shared_headers_split_on_caret() {
        let mut cfg = FederatorConfig::default();
        cfg.shared_headers = "x-trace-id^x-tenant".to_string();
        assert_eq!(cfg.shared_header_set(), vec!["x-trace-id", "x-tenant"]);
    }
}
