//! `FileStreamer` (`spec.md §4.7`): reads one logical file through a
//! [`StorageProvider`] and emits it as an ordered sequence of
//! fixed-size-block [`fed_types::Chunk`]s, ending with a metadata-only
//! chunk carrying the SHA-256 checksum.

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use fed_ore::FederatorError;
use fed_types::{total_chunks, Chunk, FileTransfer};

use crate::storage::StorageProvider;

pub struct FileStreamer {
    chunk_size: usize,
}

impl FileStreamer {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Streams `transfer` from `provider`, invoking `emit` for every chunk
    /// in order (including the trailing metadata-only chunk). Returns once
    /// the file has been fully emitted or an I/O error maps to
    /// [`FederatorError::Transient`] / [`FederatorError::Integrity`].
    pub async fn stream<E>(
        &self,
        transfer: &FileTransfer,
        provider: &dyn StorageProvider,
        mut emit: E,
    ) -> Result<(), FederatorError>
    where
        E: FnMut(Chunk) -> Result<(), FederatorError>,
    {
        let mut opened = provider
            .open(&transfer.storage_container, &transfer.path)
            .await?;
        let size = opened.size;
        let total = total_chunks(size, self.chunk_size as u64);
        let file_name = transfer.file_name().to_string();

        let mut digest = Sha256::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut index = 0i32;
        loop {
            let n = opened
                .reader
                .read(&mut buf)
                .await
                .map_err(|e| FederatorError::transient(format!("reading {file_name}: {e}")))?;
            if n == 0 {
                break;
            }
            digest.update(&buf[..n]);
            emit(Chunk {
                file_name: file_name.clone(),
                chunk_data: buf[..n].to_vec(),
                chunk_index: index,
                total_chunks: total,
                is_last_chunk: false,
                file_checksum: None,
                file_size: size as i64,
                file_sequence_id: transfer.sequence_id,
            })?;
            index += 1;
        }

        emit(Chunk {
            file_name,
            chunk_data: Vec::new(),
            chunk_index: index,
            total_chunks: total,
            is_last_chunk: true,
            file_checksum: Some(hex::encode(digest.finalize())),
            file_size: size as i64,
            file_sequence_id: transfer.sequence_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorageProvider;
    use fed_types::SourceKind;
    use std::io::Write;

    #[tokio::test]
    async fn streams_file_in_fixed_blocks_with_trailing_checksum_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::File::create(&path).unwrap().write_all(&[7u8; 25]).unwrap();

        let transfer = FileTransfer {
            source_kind: SourceKind::Local,
            storage_container: dir.path().to_str().unwrap().to_string(),
            path: "data.bin".into(),
            sequence_id: 1,
        };
        let streamer = FileStreamer::new(10);
        let mut chunks = Vec::new();
        streamer
            .stream(&transfer, &LocalStorageProvider, |c| {
                chunks.push(c);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(chunks.len(), 4); // 10 + 10 + 5 data chunks + 1 final
        assert!(chunks[..3].iter().all(|c| !c.is_last_chunk));
        let last = chunks.last().unwrap();
        assert!(last.is_last_chunk);
        assert!(last.chunk_data.is_empty());
        assert!(last.file_checksum.is_some());
        assert!(chunks.iter().all(|c| c.total_chunks == 3));
    }

    #[tokio::test]
    async fn empty_file_emits_only_the_final_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::File::create(&path).unwrap();

        let transfer = FileTransfer {
            source_kind: SourceKind::Local,
            storage_container: dir.path().to_str().unwrap().to_string(),
            path: "empty.bin".into(),
            sequence_id: 2,
        };
        let streamer = FileStreamer::new(10);
        let mut chunks = Vec::new();
        streamer
            .stream(&transfer, &LocalStorageProvider, |c| {
                chunks.push(c);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_last_chunk);
        assert_eq!(chunks[0].total_chunks, 0);
    }
}
