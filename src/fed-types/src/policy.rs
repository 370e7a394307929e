//! Policy-service JSON schema (`spec.md §6`) and the in-memory snapshot it
//! parses into.
//!
//! The wire JSON has producers owning products owning consumers, which reads
//! like a cycle once you start asking "which producer is this consumer
//! under?". We keep the ownership direction strictly downward: a
//! [`ConfigSnapshot`] owns [`Producer`]s which own [`Product`]s which own
//! [`Subscription`]s. Anything that needs to go the other way does so by id,
//! via a lookup helper, never by a stored back-reference.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::ids::PeerId;

/// Which side of a policy response this snapshot represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Producer,
    Consumer,
}

/// A single attribute the `Security-Label` header must carry for a record to
/// pass the filter. Name and value are stored case-folded so comparisons
/// never need to re-fold them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRequirement {
    name: String,
    value: String,
}

impl AttributeRequirement {
    /// Builds a requirement, rejecting empty name/value per the data-model
    /// invariant `name ≠ ∅ ∧ value ≠ ∅`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Option<Self> {
        let name = name.into().to_lowercase();
        let value = value.into().to_lowercase();
        if name.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A grant for `consumer_idp_client_id` to receive the enclosing
/// [`Product`], gated by zero or more [`AttributeRequirement`]s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    pub name: String,
    pub idp_client_id: String,
    #[serde(default)]
    attributes_raw: Vec<RawAttribute>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RawAttribute {
    name: String,
    value: String,
}

impl Consumer {
    pub fn attributes(&self) -> Vec<AttributeRequirement> {
        self.attributes_raw
            .iter()
            .filter_map(|a| AttributeRequirement::new(a.name.clone(), a.value.clone()))
            .collect()
    }
}

/// A policy-declared topic offering, bound to exactly one source topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub topic: String,
    #[serde(default)]
    pub consumers: Vec<Consumer>,
    /// Which Federator node is responsible for running the job serving this
    /// product. Absent in single-node deployments, in which case the
    /// reconciler treats every product as owned by the local node.
    #[serde(default, rename = "managementNodeId")]
    pub management_node_id: Option<String>,
}

impl Product {
    /// True iff `idp_client_id` is listed as an authorised consumer,
    /// case-insensitively (matches token `azp` comparisons in `spec.md §4.5`).
    pub fn authorises(&self, idp_client_id: &str) -> bool {
        self.consumers
            .iter()
            .any(|c| c.idp_client_id.eq_ignore_ascii_case(idp_client_id))
    }
}

/// A counterpart Federator instance as declared by policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Producer {
    pub name: String,
    pub idp_client_id: String,
    pub host: String,
    pub port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub products: Vec<Product>,
}

fn default_true() -> bool {
    true
}

impl Producer {
    pub fn peer_id(&self) -> PeerId {
        PeerId::from(self.name.as_str())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Projects the connection-relevant fields into a standalone [`Peer`].
    pub fn peer(&self, expected_audience: impl Into<String>) -> Peer {
        Peer {
            peer_id: self.peer_id(),
            address: self.address(),
            tls: self.tls,
            expected_audience: expected_audience.into(),
        }
    }
}

/// The counterpart Federator instance at the other end of a streaming
/// channel, reduced to exactly the fields a transport needs to dial it.
/// Derived from a [`Producer`] entry rather than stored independently, so
/// there is exactly one address per peer id at a time (`spec.md §3`
/// invariant).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peer {
    pub peer_id: PeerId,
    pub address: String,
    pub tls: bool,
    pub expected_audience: String,
}

/// A `Subscription` is the flattened, queryable form of a [`Consumer`] grant:
/// `(consumer id, product id, attribute requirements)`, as named in the data
/// model (`spec.md §3`). [`Product::consumers`] is the storage
/// representation; callers needing the relational view use
/// [`ConfigSnapshot::subscriptions_for`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub consumer_idp_client_id: String,
    pub product_name: String,
    pub requirements: Vec<AttributeRequirement>,
}

/// One immutable parse of a policy response, for either role.
#[derive(Clone, Debug)]
pub struct ConfigSnapshot {
    pub client_id: String,
    pub kind: ConfigKind,
    pub producers: Vec<Producer>,
    pub fetched_at: SystemTime,
    pub ttl: Duration,
}

/// Wire shape of `GET /configuration/{producer,consumer}` (`spec.md §6`).
/// Producer and consumer responses share this shape; only which array the
/// policy service happens to name differs, and `serde(alias)` absorbs that.
#[derive(Deserialize)]
struct RawConfigBody {
    #[serde(rename = "clientId")]
    client_id: String,
    #[serde(alias = "producers", alias = "consumers")]
    producers: Vec<Producer>,
}

impl ConfigSnapshot {
    /// Parses a policy-service JSON body into a snapshot that is
    /// self-consistent by construction: every product's consumer list is
    /// already attached, and there are no dangling references to resolve.
    pub fn parse(kind: ConfigKind, body: &[u8], ttl: Duration) -> Result<Self, serde_json::Error> {
        let raw: RawConfigBody = serde_json::from_slice(body)?;
        Ok(Self {
            client_id: raw.client_id,
            kind,
            producers: raw.producers,
            fetched_at: SystemTime::now(),
            ttl,
        })
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now.duration_since(self.fetched_at).unwrap_or_default() >= self.ttl
    }

    /// All `(peer id, topic)` pairs owned by `node_id` (or unowned, in
    /// single-node deployments), for the reconciler's desired-set
    /// computation (`spec.md §4.4` step 2).
    pub fn owned_topics(&self, node_id: &str) -> Vec<(PeerId, String)> {
        let mut out = Vec::new();
        for producer in &self.producers {
            let peer_id = producer.peer_id();
            for product in &producer.products {
                let owned = match &product.management_node_id {
                    Some(owner) => owner == node_id,
                    None => true,
                };
                if owned {
                    out.push((peer_id.clone(), product.topic.clone()));
                }
            }
        }
        out
    }

    /// Every producer entry whose peer id matches, across the whole
    /// snapshot. The authorisation interceptor (`spec.md §4.5`) walks all
    /// of these, not just the first, per the resolved open question in
    /// `DESIGN.md`.
    pub fn producer(&self, peer_id: &PeerId) -> Option<&Producer> {
        self.producers.iter().find(|p| &p.peer_id() == peer_id)
    }

    /// Whether `idp_client_id` is authorised for `topic`, per the resolved
    /// open question in `DESIGN.md`: every producer entry's products are
    /// considered, not just the first, since a single node may legitimately
    /// appear under more than one producer entry in the snapshot.
    pub fn authorises_topic(&self, topic: &str, idp_client_id: &str) -> bool {
        self.requirements_for(topic, idp_client_id).is_some()
    }

    /// The attribute requirements gating `idp_client_id`'s subscription to
    /// `topic`, or `None` if unauthorised. Searches every producer entry
    /// (same resolved open question as [`Self::authorises_topic`]) and
    /// returns the first matching consumer grant found.
    pub fn requirements_for(&self, topic: &str, idp_client_id: &str) -> Option<Vec<AttributeRequirement>> {
        self.producers.iter().find_map(|producer| {
            producer.products.iter().find_map(|product| {
                if product.topic != topic {
                    return None;
                }
                product
                    .consumers
                    .iter()
                    .find(|c| c.idp_client_id.eq_ignore_ascii_case(idp_client_id))
                    .map(|c| c.attributes())
            })
        })
    }
}
