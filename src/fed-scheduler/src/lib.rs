//! Reconciler and cron-like scheduler shared by the producer and consumer
//! processes (`spec.md §4.4`).

pub mod plan;
pub mod runner;
pub mod scheduler;
pub mod snapshot;

pub use plan::{diff, ReconcilePlan};
pub use runner::JobRunner;
pub use scheduler::Scheduler;
pub use snapshot::{jobs_from_snapshot, JobDefaults};
