//! The reconcile diff (`spec.md §4.4` steps 4-6): a pure function from
//! desired and current job sets to a plan, independently testable without a
//! running scheduler (`spec.md §8` reconciler-idempotence property).

use std::collections::HashMap;

use fed_types::{JobId, JobSpec, StreamJob};

/// What one reload cycle must do to the live job set: stop jobs no longer
/// desired, restart jobs whose parameters changed, and start brand-new
/// ones. Computed by value, not by job-handle identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcilePlan {
    pub delete: Vec<JobId>,
    pub recreate: Vec<JobSpec>,
    pub create: Vec<JobSpec>,
}

/// Computes the plan to move from `current` to `desired`. Both slices are
/// assumed to already be filtered to this node's jobs (`jobs_from_snapshot`
/// filters `desired` via `owned_topics`; the caller filters `current` the
/// same way before calling), so this function never needs a node id.
pub fn diff(desired: &[JobSpec], current: &[StreamJob]) -> ReconcilePlan {
    let desired_by_id: HashMap<JobId, &JobSpec> = desired.iter().map(|s| (s.job_id(), s)).collect();
    let current_by_id: HashMap<&JobId, &StreamJob> = current.iter().map(|j| (&j.id, j)).collect();

    let mut delete = Vec::new();
    for job in current {
        if !desired_by_id.contains_key(&job.id) {
            delete.push(job.id.clone());
        }
    }

    let mut recreate = Vec::new();
    let mut create = Vec::new();
    for spec in desired {
        match current_by_id.get(&spec.job_id()) {
            Some(existing) if existing.spec != *spec => recreate.push(spec.clone()),
            Some(_) => {}
            None => create.push(spec.clone()),
        }
    }

    ReconcilePlan { delete, recreate, create }
}
