//! Per `(peer, topic)` worker jobs (`spec.md §3`, `§4.4`).

use crate::ids::{JobId, PeerId};

/// The value-compared parameters of a [`StreamJob`]. Two jobs with the same
/// id but different specs must be deleted and recreated by the reconciler
/// (`spec.md §4.4` step 5); this type exists so that comparison is a plain
/// `PartialEq` derive rather than hand-rolled field-by-field logic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobSpec {
    pub peer_id: PeerId,
    pub topic: String,
    /// Cron-like recurrence expression.
    pub schedule: String,
    pub retry_count: u32,
    pub peer_endpoint: String,
    pub peer_tls: bool,
    pub audience: String,
    /// Run once immediately upon registration, in addition to the schedule.
    pub run_immediately: bool,
}

impl JobSpec {
    pub fn job_id(&self) -> JobId {
        JobId::new(&self.peer_id, &self.topic)
    }
}

/// A live per-`(peer, topic)` worker. Restarts reuse the same [`JobId`]; the
/// scheduler is the sole owner of the set of live jobs (`spec.md §3`
/// ownership note).
#[derive(Clone, Debug)]
pub struct StreamJob {
    pub id: JobId,
    pub spec: JobSpec,
}

impl StreamJob {
    pub fn new(spec: JobSpec) -> Self {
        Self {
            id: spec.job_id(),
            spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(retry_count: u32) -> JobSpec {
        JobSpec {
            peer_id: PeerId::from("peer-a"),
            topic: "orders".into(),
            schedule: "*/30 * * * * *".into(),
            retry_count,
            peer_endpoint: "peer-a.internal:8443".into(),
            peer_tls: true,
            audience: "federator".into(),
            run_immediately: true,
        }
    }

    #[test]
    fn jobs_with_same_params_compare_equal() {
        assert_eq!(spec(1), spec(1));
        assert_ne!(spec(1), spec(3));
    }

    #[test]
    fn job_id_is_stable_across_spec_changes() {
        let a = StreamJob::new(spec(1));
        let b = StreamJob::new(spec(3));
        assert_eq!(a.id, b.id);
    }
}
