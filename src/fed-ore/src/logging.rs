//! Process-wide `tracing` bootstrap. Called exactly once from each binary's
//! `main`; never a lazily-initialised global singleton.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` fmt layer with the given default filter
/// directive, overridable via `RUST_LOG`.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
