//! File transfer and chunk types (`spec.md §3`, `§6`).

use serde::{Deserialize, Serialize};

/// Where a [`FileTransfer`]'s bytes live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    Local,
    S3,
    Azure,
}

/// The file-source JSON carried as an event value (`spec.md §6`):
/// `{ "sourceType": ..., "storageContainer": ..., "path": ... }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTransfer {
    #[serde(rename = "sourceType")]
    pub source_kind: SourceKind,
    pub storage_container: String,
    pub path: String,
    /// Strictly increasing per `(peer, topic)`; identifies the file across
    /// resumes. Not part of the wire JSON — assigned by the producer when
    /// the transfer is scheduled.
    #[serde(skip)]
    pub sequence_id: i64,
}

impl FileTransfer {
    pub fn file_name(&self) -> &str {
        // Reduce to the last path component, matching the traversal guard
        // the assembler applies on the consumer side (`spec.md §4.8`).
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.path)
    }
}

/// One message in a file-streaming sequence. The final chunk is
/// metadata-only and carries the checksum, per `spec.md §6`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub file_name: String,
    pub chunk_data: Vec<u8>,
    pub chunk_index: i32,
    pub total_chunks: i32,
    pub is_last_chunk: bool,
    /// Hex-encoded SHA-256, set only when `is_last_chunk`.
    pub file_checksum: Option<String>,
    pub file_size: i64,
    pub file_sequence_id: i64,
}

/// `ceil(size / chunk_size)`, with the `ceil(0/n) = 0` convention from
/// `spec.md §8`'s boundary behaviours.
pub fn total_chunks(size: u64, chunk_size: u64) -> i32 {
    debug_assert!(chunk_size > 0, "chunk_size must be positive");
    let chunks = (size + chunk_size - 1) / chunk_size;
    i32::try_from(chunks).unwrap_or(i32::MAX)
}
