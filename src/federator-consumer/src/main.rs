//! Consumer process entry point: polls the policy service for this node's
//! owned topics and keeps a [`fed_scheduler::Scheduler`] of [`ClientWorker`]
//! jobs in sync with the latest snapshot (`spec.md §4.4`, `§4.6`).

use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;

use fed_auth::{TokenClient, TokenClientConfig};
use fed_config::FederatorConfig;
use fed_scheduler::{jobs_from_snapshot, JobDefaults, JobRunner, Scheduler};
use fed_types::JobSpec;
use fed_worker::{ClientWorker, CursorStore, InMemoryCursorStore, LocalPublisher, RecordingPublisher, WorkerOutcome};

/// Federator consumer: streams topics this node is entitled to from their
/// owning producers and republishes the records locally.
#[derive(Parser, Debug)]
#[command(name = "federator-consumer")]
struct Args {
    /// Path to a TOML or JSON configuration file; see `federator-producer
    /// --help` for the shared format.
    #[arg(long, value_name = "PATH")]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(error) = run(args).await {
        eprintln!("federator-consumer: fatal: {error:#}");
        process::exit(1);
    }
}

/// Runs one job's worker to completion and reports whether the scheduler
/// should keep scheduling it.
struct ConsumerJobRunner {
    tokens: Arc<TokenClient>,
    cursor_store: Arc<dyn CursorStore>,
    publisher: Arc<dyn LocalPublisher>,
    idle_timeout: Duration,
}

#[async_trait]
impl JobRunner for ConsumerJobRunner {
    async fn run_once(&self, spec: &JobSpec) -> bool {
        let worker = ClientWorker::new(
            spec.clone(),
            Arc::clone(&self.tokens),
            Arc::clone(&self.cursor_store),
            Arc::clone(&self.publisher),
            self.idle_timeout,
        );
        match worker.run().await {
            WorkerOutcome::Idle => true,
            WorkerOutcome::Fatal(error) => {
                tracing::error!(job = %spec.job_id(), %error, "worker stopped with a non-transient error");
                false
            }
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = FederatorConfig::load(args.config.as_deref()).context("loading configuration")?;
    fed_ore::logging::init(&config.log_filter);
    tracing::info!(node_id = %config.node_id, "starting federator-consumer");

    let tokens = Arc::new(TokenClient::new(TokenClientConfig {
        token_url: config.idp.token_url.clone(),
        jwks_url: config.idp.jwks_url.clone(),
        client_id: config.idp.client_id.clone(),
        client_secret: config.idp.client_secret.clone(),
        mtls_enabled: config.idp.mtls_enabled,
        keystore_path: config.idp.keystore_path.clone(),
        keystore_password: config.idp.keystore_password.clone(),
        audience: config.idp.audience.clone(),
        refresh_buffer: Duration::from_secs(config.idp.refresh_buffer_secs),
    })
    .context("building token client")?);
    let _refresher = fed_auth::spawn_refresher(Arc::clone(&tokens), Duration::from_secs(10));

    let policy = fed_policy::PolicyClient::new(
        config.policy_service_url.clone(),
        Arc::clone(&tokens),
        Duration::from_secs(config.cache_ttl_secs),
    );

    // The cursor store and local event bus are external collaborators
    // (`spec.md §1`); these in-memory adapters are the seam a real
    // persistence layer and bus plug into.
    let cursor_store: Arc<dyn CursorStore> = Arc::new(InMemoryCursorStore::default());
    let publisher: Arc<dyn LocalPublisher> = Arc::new(RecordingPublisher::default());

    let runner = Arc::new(ConsumerJobRunner {
        tokens: Arc::clone(&tokens),
        cursor_store,
        publisher,
        idle_timeout: config.client.idle_timeout(),
    });
    let scheduler = Scheduler::new(runner);

    let defaults = JobDefaults {
        schedule: config.job.schedule.clone(),
        retry_count: config.job.retry_count,
        audience: config.idp.audience.clone(),
        run_immediately: config.job.run_immediately,
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(config.reload_interval_secs));
    loop {
        ticker.tick().await;
        match policy.get_consumer_config(None).await {
            Ok(snapshot) => {
                let jobs = jobs_from_snapshot(&snapshot, &config.node_id, &defaults);
                tracing::info!(count = jobs.len(), "reconciling job set from latest snapshot");
                scheduler.reload(jobs);
            }
            Err(error) => {
                tracing::warn!(%error, "failed to fetch consumer configuration; keeping current job set");
            }
        }
    }
}
