//! Background token refresher (`spec.md §4.2`): a single task holds the
//! current token; refresh failures back off exponentially (200ms -> 5min)
//! and are surfaced as "transient authentication unavailable".

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use fed_ore::Retry;

use crate::client::TokenClient;

/// Spawns the background refresher. Runs until the returned handle is
/// dropped or aborted.
pub fn spawn_refresher(client: Arc<TokenClient>, poll_interval: Duration) -> JoinHandle<()> {
    let retry = Retry::default()
        .initial_backoff(Duration::from_millis(200))
        .clamp_backoff(Duration::from_secs(5 * 60))
        .max_attempts(u32::MAX)
        .with_jitter();

    tokio::spawn(async move {
        loop {
            let needs_refresh = match client.current().await {
                Ok(token) => client.should_refresh(&token),
                Err(_) => true,
            };
            if needs_refresh {
                let result: Result<(), fed_ore::FederatorError> = retry
                    .retry_async(|_state| async {
                        client.fetch().await.map(|_| ())
                    })
                    .await;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "transient authentication unavailable");
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    })
}
