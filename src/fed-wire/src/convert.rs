//! Conversions between the domain types in `fed-types` and the generated
//! protobuf messages. Kept as plain `From`/`TryFrom` impls rather than a
//! generic `RustType`/`ProtoType` trait pair: the wire shape here is fixed
//! by `spec.md §6` and small enough that the indirection would not earn
//! its keep.

use fed_ore::FederatorError;
use fed_types::Record;

use crate::pb;

impl From<Record> for pb::Batch {
    fn from(record: Record) -> Self {
        pb::Batch {
            topic: record.topic,
            offset: record.offset,
            key: record.key,
            value: record.value,
            shared: record
                .headers
                .into_iter()
                .map(|(key, value)| pb::HeaderEntry { key, value })
                .collect(),
        }
    }
}

impl From<pb::Batch> for Record {
    fn from(batch: pb::Batch) -> Self {
        Record {
            topic: batch.topic,
            offset: batch.offset,
            key: batch.key,
            value: batch.value,
            headers: batch
                .shared
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
        }
    }
}

impl From<fed_types::Chunk> for pb::Chunk {
    fn from(chunk: fed_types::Chunk) -> Self {
        pb::Chunk {
            file_name: chunk.file_name,
            chunk_data: chunk.chunk_data,
            chunk_index: chunk.chunk_index,
            total_chunks: chunk.total_chunks,
            is_last_chunk: chunk.is_last_chunk,
            file_checksum: chunk.file_checksum.unwrap_or_default(),
            file_size: chunk.file_size,
            file_sequence_id: chunk.file_sequence_id,
        }
    }
}

impl TryFrom<pb::Chunk> for fed_types::Chunk {
    type Error = FederatorError;

    fn try_from(chunk: pb::Chunk) -> Result<Self, Self::Error> {
        if chunk.is_last_chunk && chunk.file_checksum.is_empty() {
            return Err(FederatorError::Protocol(
                "final chunk missing file_checksum".into(),
            ));
        }
        Ok(fed_types::Chunk {
            file_name: chunk.file_name,
            chunk_data: chunk.chunk_data,
            chunk_index: chunk.chunk_index,
            total_chunks: chunk.total_chunks,
            is_last_chunk: chunk.is_last_chunk,
            file_checksum: (!chunk.file_checksum.is_empty()).then_some(chunk.file_checksum),
            file_size: chunk.file_size,
            file_sequence_id: chunk.file_sequence_id,
        })
    }
}
