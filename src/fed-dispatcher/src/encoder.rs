//! `BatchEncoder` (`spec.md §4.5` step 2): builds the wire `Batch` for a
//! record, restricting shared headers to the server's declared whitelist.

use std::collections::HashSet;

use fed_types::Record;
use fed_wire::pb;

pub struct BatchEncoder {
    shared_headers: HashSet<String>,
}

impl BatchEncoder {
    pub fn new(shared_headers: HashSet<String>) -> Self {
        Self { shared_headers }
    }

    pub fn encode(&self, record: Record) -> pb::Batch {
        let headers = record
            .headers
            .into_iter()
            .filter(|(key, _)| self.shared_headers.iter().any(|h| h.eq_ignore_ascii_case(key)))
            .collect();
        let filtered = Record {
            topic: record.topic,
            offset: record.offset,
            key: record.key,
            value: record.value,
            headers,
        };
        filtered.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record {
            topic: "orders".into(),
            offset: 1,
            key: b"k".to_vec(),
            value: b"v".to_vec(),
            headers: vec![
                ("Security-Label".into(), b"nationality=GBR".to_vec()),
                ("trace-id".into(), b"abc".to_vec()),
            ],
        }
    }

    #[test]
    fn only_whitelisted_headers_are_shared() {
        let encoder = BatchEncoder::new(HashSet::from(["trace-id".to_string()]));
        let batch = encoder.encode(record());
        assert_eq!(batch.shared.len(), 1);
        assert_eq!(batch.shared[0].key, "trace-id");
    }

    #[test]
    fn empty_whitelist_shares_nothing() {
        let encoder = BatchEncoder::new(HashSet::new());
        let batch = encoder.encode(record());
        assert!(batch.shared.is_empty());
    }
}
