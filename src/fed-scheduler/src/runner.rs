//! The seam between the scheduler and what a job actually does when it
//! fires. The consumer binary implements this with a [`fed_types::JobSpec`]
//! -driven `ClientWorker`; the producer side has no outbound jobs of its
//! own but shares the same reconcile/cron machinery for future use.

use async_trait::async_trait;

use fed_types::JobSpec;

#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Runs one tick of `spec` to completion. Returns `false` to stop
    /// scheduling further ticks for this job — a non-transient failure the
    /// scheduler surfaces rather than relaunching blindly (`spec.md §4.6`).
    async fn run_once(&self, spec: &JobSpec) -> bool;
}
