//! Builds the desired job set from a policy snapshot (`spec.md §4.4` step
//! 2). The policy JSON schema (`spec.md §6`) carries no per-product
//! schedule, retry count, or audience, so those come from this node's own
//! configuration rather than the snapshot.

use fed_types::{ConfigSnapshot, JobSpec};

/// Node-level parameters applied to every job built from a snapshot.
#[derive(Debug, Clone)]
pub struct JobDefaults {
    pub schedule: String,
    pub retry_count: u32,
    pub audience: String,
    pub run_immediately: bool,
}

/// The `(peer, topic)` jobs `node_id` owns per `snapshot`
/// (`spec.md §4.4` step 2), each resolved to a dialable [`JobSpec`] via the
/// owning producer's address and transport-security flag. A topic whose
/// producer entry is missing from the snapshot is silently skipped; the
/// next reload will pick it up once the producer entry reappears.
pub fn jobs_from_snapshot(snapshot: &ConfigSnapshot, node_id: &str, defaults: &JobDefaults) -> Vec<JobSpec> {
    snapshot
        .owned_topics(node_id)
        .into_iter()
        .filter_map(|(peer_id, topic)| {
            let producer = snapshot.producer(&peer_id)?;
            Some(JobSpec {
                peer_id,
                topic,
                schedule: defaults.schedule.clone(),
                retry_count: defaults.retry_count,
                peer_endpoint: producer.address(),
                peer_tls: producer.tls,
                audience: defaults.audience.clone(),
                run_immediately: defaults.run_immediately,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fed_types::{ConfigKind, PeerId};
    use std::time::Duration;

    const BODY: &str = r#"{
        "clientId": "FEDERATOR_X",
        "producers": [
            {
                "name": "peer-a", "idpClientId": "idp-a", "host": "peer-a.internal", "port": 8443,
                "tls": true, "active": true,
                "products": [
                    { "name": "orders-feed", "topic": "orders", "consumers": [] },
                    { "name": "eu-orders-feed", "topic": "orders-eu", "managementNodeId": "node-b", "consumers": [] }
                ]
            }
        ]
    }"#;

    fn defaults() -> JobDefaults {
        JobDefaults {
            schedule: "*/30 * * * * *".into(),
            retry_count: 3,
            audience: "federator".into(),
            run_immediately: true,
        }
    }

    #[test]
    fn builds_a_job_per_owned_topic_with_producer_connection_details() {
        let snap = ConfigSnapshot::parse(ConfigKind::Consumer, BODY.as_bytes(), Duration::from_secs(30)).unwrap();
        let jobs = jobs_from_snapshot(&snap, "node-a", &defaults());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].peer_id, PeerId::from("peer-a"));
        assert_eq!(jobs[0].topic, "orders");
        assert_eq!(jobs[0].peer_endpoint, "peer-a.internal:8443");
        assert!(jobs[0].peer_tls);
    }

    #[test]
    fn skips_topics_owned_by_another_node() {
        let snap = ConfigSnapshot::parse(ConfigKind::Consumer, BODY.as_bytes(), Duration::from_secs(30)).unwrap();
        let jobs = jobs_from_snapshot(&snap, "node-b", &defaults());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].topic, "orders-eu");
    }
}
