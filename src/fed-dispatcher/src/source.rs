//! `EventSource` (`spec.md §4.5`): the abstraction over the local log the
//! dispatcher reads from. The log itself is an external collaborator
//! (`spec.md §1`); this trait is the seam a real log-reader adapter plugs
//! into, mirrored on an in-memory implementation for tests.

use async_trait::async_trait;

use fed_types::{FileTransfer, Record};

/// The outcome of one read attempt at a given offset.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A record was available at or after the requested offset.
    Record(Record),
    /// Nothing new yet; the caller should track idle time and retry.
    Empty,
    /// The requested offset is behind the log's retention window.
    OutOfRange,
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Reads the next record at or after `offset` on `topic`, or reports
    /// that none is available yet (or ever will be, if retention has
    /// passed it by).
    async fn read_after(&self, topic: &str, offset: i64) -> ReadOutcome;
}

/// An in-memory [`EventSource`] backed by a fixed, pre-sorted vector of
/// records, for dispatcher tests. Treats any offset past the end of the
/// vector as merely empty (more may arrive); only offsets below the
/// earliest retained record are out of range.
pub struct InMemorySource {
    records: Vec<Record>,
    retained_from: i64,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>, retained_from: i64) -> Self {
        Self {
            records,
            retained_from,
        }
    }
}

#[async_trait]
impl EventSource for InMemorySource {
    async fn read_after(&self, topic: &str, offset: i64) -> ReadOutcome {
        if offset < self.retained_from {
            return ReadOutcome::OutOfRange;
        }
        match self
            .records
            .iter()
            .find(|r| r.topic == topic && r.offset >= offset)
        {
            Some(record) => ReadOutcome::Record(record.clone()),
            None => ReadOutcome::Empty,
        }
    }
}

/// Resolves the [`FileTransfer`] a `StreamFile` request should serve: the
/// producer-side seam onto whatever announces pending file transfers on a
/// topic (typically events on the same log `EventSource` reads).
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn resolve(&self, topic: &str, start_sequence_id: i64) -> Option<FileTransfer>;
}

/// An in-memory [`FileSource`] for tests: a fixed set of transfers, picking
/// the one with the smallest sequence id at or after `start_sequence_id`.
pub struct InMemoryFileSource {
    transfers: Vec<FileTransfer>,
}

impl InMemoryFileSource {
    pub fn new(transfers: Vec<FileTransfer>) -> Self {
        Self { transfers }
    }
}

#[async_trait]
impl FileSource for InMemoryFileSource {
    async fn resolve(&self, _topic: &str, start_sequence_id: i64) -> Option<FileTransfer> {
        self.transfers
            .iter()
            .filter(|t| t.sequence_id >= start_sequence_id)
            .min_by_key(|t| t.sequence_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(topic: &str, offset: i64) -> Record {
        Record {
            topic: topic.into(),
            offset,
            key: vec![],
            value: vec![],
            headers: vec![],
        }
    }

    #[tokio::test]
    async fn reads_first_record_at_or_after_offset() {
        let source = InMemorySource::new(vec![record("orders", 5), record("orders", 6)], 0);
        let outcome = source.read_after("orders", 5).await;
        assert!(matches!(outcome, ReadOutcome::Record(r) if r.offset == 5));
    }

    #[tokio::test]
    async fn offset_behind_retention_is_out_of_range() {
        let source = InMemorySource::new(vec![record("orders", 5)], 3);
        let outcome = source.read_after("orders", 1).await;
        assert!(matches!(outcome, ReadOutcome::OutOfRange));
    }

    #[tokio::test]
    async fn offset_past_the_end_is_empty_not_out_of_range() {
        let source = InMemorySource::new(vec![record("orders", 5)], 0);
        let outcome = source.read_after("orders", 100).await;
        assert!(matches!(outcome, ReadOutcome::Empty));
    }
}
