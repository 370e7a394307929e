//! A single event read from the upstream log and delivered over the wire
//! (`spec.md §6`'s `Batch` message, kept in domain form until it crosses
//! the wire boundary).

/// One key/value record at a given topic offset, with the shared (headers)
/// attributes the filter matches against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub topic: String,
    pub offset: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub headers: Vec<(String, Vec<u8>)>,
}

impl Record {
    /// Case-folded lookup used by the attribute filter; headers are not
    /// deduplicated by key, so the first match wins.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let record = Record {
            topic: "orders".into(),
            offset: 0,
            key: vec![],
            value: vec![],
            headers: vec![("Security-Label".into(), b"public".to_vec())],
        };
        assert_eq!(record.header("security-label"), Some(b"public".as_slice()));
        assert_eq!(record.header("missing"), None);
    }
}
