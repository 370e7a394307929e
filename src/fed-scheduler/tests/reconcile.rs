//! The reconciler seed scenario (`spec.md §8` scenario 3): job `A` is
//! dropped, `B`'s changed retry count forces a delete-and-recreate, `C` is
//! newly created, and a job belonging to another node is never considered
//! in the first place.

use fed_scheduler::diff;
use fed_types::{JobSpec, PeerId, StreamJob};

fn spec(topic: &str, retry_count: u32) -> JobSpec {
    JobSpec {
        peer_id: PeerId::from("peer-a"),
        topic: topic.into(),
        schedule: "*/30 * * * * *".into(),
        retry_count,
        peer_endpoint: "peer-a.internal:8443".into(),
        peer_tls: true,
        audience: "federator".into(),
        run_immediately: true,
    }
}

#[test]
fn delete_recreate_and_create_in_one_reload() {
    let job_a = spec("a-topic", 1);
    let job_b_old = spec("b-topic", 1);
    let job_b_new = spec("b-topic", 3);
    let job_c = spec("c-topic", 1);

    // `X` belongs to another node and was filtered out of `current` before
    // it ever reached `diff` (the caller only tracks jobs for this node).
    let current = vec![StreamJob::new(job_a.clone()), StreamJob::new(job_b_old)];
    let desired = vec![job_b_new.clone(), job_c.clone()];

    let plan = diff(&desired, &current);

    assert_eq!(plan.delete, vec![job_a.job_id()]);
    assert_eq!(plan.recreate, vec![job_b_new]);
    assert_eq!(plan.create, vec![job_c]);
}

#[test]
fn reload_twice_with_same_inputs_produces_no_further_changes() {
    let desired = vec![spec("a-topic", 1), spec("b-topic", 3)];
    let current: Vec<StreamJob> = desired.iter().cloned().map(StreamJob::new).collect();

    let plan = diff(&desired, &current);

    assert!(plan.delete.is_empty());
    assert!(plan.recreate.is_empty());
    assert!(plan.create.is_empty());
}
