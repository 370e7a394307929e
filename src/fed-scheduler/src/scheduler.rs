//! `Scheduler` (`spec.md §4.4`): owns the live `StreamJob` set and drives
//! each job's cron-like recurrence. Deleting or recreating a job is just
//! dropping its [`AbortOnDropHandle`] — the corpus's per-replica task
//! pattern (`fed_ore::task`) already guarantees the task stops the moment
//! the handle is dropped.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use cron::Schedule;

use fed_ore::task::{spawn, AbortOnDropHandle, JoinHandleExt};
use fed_types::{JobId, JobSpec, StreamJob};

use crate::plan::diff;
use crate::runner::JobRunner;

struct Entry {
    spec: JobSpec,
    _handle: AbortOnDropHandle<()>,
}

/// Owns the live job set for one node and reconciles it against
/// successive snapshots. Generic over [`JobRunner`] so the same reconcile
/// and cron logic serves both processes.
pub struct Scheduler<R> {
    runner: Arc<R>,
    jobs: Mutex<HashMap<JobId, Entry>>,
}

impl<R: JobRunner + 'static> Scheduler<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            runner,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Applies one reload cycle (`spec.md §4.4` steps 4-6) against
    /// `desired`, the `(peer, topic)` jobs this node owns per the latest
    /// snapshot (typically built with [`crate::jobs_from_snapshot`]).
    pub fn reload(&self, desired: Vec<JobSpec>) {
        let mut jobs = self.jobs.lock().unwrap();
        let current: Vec<StreamJob> = jobs.values().map(|e| StreamJob::new(e.spec.clone())).collect();
        let plan = diff(&desired, &current);

        for id in &plan.delete {
            jobs.remove(id);
        }
        for spec in plan.recreate.into_iter().chain(plan.create) {
            let id = spec.job_id();
            jobs.remove(&id);
            let handle = self.spawn_job(spec.clone());
            jobs.insert(id, Entry { spec, _handle: handle });
        }
    }

    fn spawn_job(&self, spec: JobSpec) -> AbortOnDropHandle<()> {
        let runner = Arc::clone(&self.runner);
        let name_id = spec.job_id();
        spawn(move || format!("stream-job-{name_id}"), job_loop(spec, runner)).abort_on_drop()
    }

    pub fn live_job_ids(&self) -> Vec<JobId> {
        self.jobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    /// Drops every live job, aborting its task.
    pub fn shutdown(&self) {
        self.jobs.lock().unwrap().clear();
    }
}

/// One job's lifetime: an optional immediate run, then one `run_once` per
/// cron occurrence. Ticks are awaited sequentially in this single task, so
/// overlapping executions of the same job id (`spec.md §4.4` scheduling
/// model) are structurally impossible rather than separately guarded.
async fn job_loop<R: JobRunner>(spec: JobSpec, runner: Arc<R>) {
    let schedule = match Schedule::from_str(&spec.schedule) {
        Ok(schedule) => schedule,
        Err(error) => {
            tracing::error!(job = %spec.job_id(), %error, "invalid schedule expression; job will never run");
            return;
        }
    };

    if spec.run_immediately && !runner.run_once(&spec).await {
        tracing::warn!(job = %spec.job_id(), "job reported a fatal status on its immediate run");
        return;
    }

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            tracing::warn!(job = %spec.job_id(), "schedule has no further occurrences");
            return;
        };
        let delay = (next - Utc::now()).to_std().unwrap_or(std::time::Duration::ZERO);
        tokio::time::sleep(delay).await;

        if !runner.run_once(&spec).await {
            tracing::warn!(job = %spec.job_id(), "job reported a fatal status; no further ticks scheduled");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use fed_types::PeerId;

    struct CountingRunner {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl JobRunner for CountingRunner {
        async fn run_once(&self, _spec: &JobSpec) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn spec(topic: &str) -> JobSpec {
        JobSpec {
            peer_id: PeerId::from("peer-a"),
            topic: topic.into(),
            schedule: "* * * * * *".into(),
            retry_count: 3,
            peer_endpoint: "peer-a.internal:8443".into(),
            peer_tls: true,
            audience: "federator".into(),
            run_immediately: true,
        }
    }

    #[tokio::test]
    async fn reload_creates_and_runs_a_new_job_immediately() {
        let runner = Arc::new(CountingRunner { calls: AtomicUsize::new(0) });
        let scheduler = Scheduler::new(Arc::clone(&runner));
        scheduler.reload(vec![spec("orders")]);
        assert_eq!(scheduler.job_count(), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(runner.calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn reload_deletes_jobs_no_longer_desired() {
        let runner = Arc::new(CountingRunner { calls: AtomicUsize::new(0) });
        let scheduler = Scheduler::new(runner);
        scheduler.reload(vec![spec("orders")]);
        assert_eq!(scheduler.job_count(), 1);
        scheduler.reload(vec![]);
        assert_eq!(scheduler.job_count(), 0);
    }

    #[tokio::test]
    async fn reload_is_idempotent_for_an_unchanged_desired_set() {
        let runner = Arc::new(CountingRunner { calls: AtomicUsize::new(0) });
        let scheduler = Scheduler::new(runner);
        let desired = vec![spec("orders")];
        scheduler.reload(desired.clone());
        let before = scheduler.live_job_ids();
        scheduler.reload(desired);
        let after = scheduler.live_job_ids();
        assert_eq!(before, after);
    }
}
