//! Newtype identifiers.
//!
//! Plain `String` ids are easy to transpose at call sites (`fn f(peer: String,
//! topic: String)`); these newtypes make that a compile error.

use std::fmt;
use std::sync::Arc;

macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl Into<Arc<str>>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s.into())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(Arc::from(s))
            }
        }
    };
}

string_id!(PeerId, "Identifies a counterpart Federator instance.");
string_id!(ProductId, "Identifies a policy-declared product (topic offering).");

/// Identifies a [`StreamJob`](crate::StreamJob): `peer id + ':' + topic`.
///
/// Constructed only via [`JobId::new`] so the `peer:topic` format stays in
/// one place.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(Arc<str>);

impl JobId {
    pub fn new(peer_id: &PeerId, topic: &str) -> Self {
        Self(Arc::from(format!("{}:{}", peer_id.as_str(), topic)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_formats_as_peer_colon_topic() {
        let id = JobId::new(&PeerId::from("FEDERATOR_X"), "orders");
        assert_eq!(id.as_str(), "FEDERATOR_X:orders");
    }
}
