//! `FileAssembler` (`spec.md §4.8`): writes incoming chunks to a temp file,
//! verifies integrity on the last chunk, and atomically finalises to the
//! destination provider. Safe under concurrent `accept` calls for
//! different files; a single mutex protects the open-assemblies map
//! (`spec.md §5`'s shared-resource policy).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use fed_ore::FederatorError;
use fed_types::Chunk;

use crate::storage::StorageProvider;

/// Key identifying one in-flight file assembly: sanitised name + sequence
/// id, per `spec.md §4.8`'s lifecycle key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct AssemblyKey {
    file_name: String,
    sequence_id: i64,
}

struct OpenAssembly {
    part_path: PathBuf,
    bytes_written: u64,
}

pub struct FileAssembler {
    temp_dir: PathBuf,
    open: Mutex<HashMap<AssemblyKey, OpenAssembly>>,
}

impl FileAssembler {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            open: Mutex::new(HashMap::new()),
        }
    }

    fn parts_dir(&self) -> PathBuf {
        self.temp_dir.join(".parts")
    }

    fn sanitised_name(chunk: &Chunk) -> String {
        chunk
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&chunk.file_name)
            .to_string()
    }

    /// Accepts one chunk. On a non-final chunk, appends its bytes to the
    /// open part file — except chunk-index 0, which truncates first, so a
    /// restarted transfer (`spec.md §8` scenario 4) doesn't duplicate bytes
    /// a prior interrupted attempt already wrote. On the final chunk,
    /// verifies and finalises, handing the result to `destination`. Returns
    /// `Ok(Some(path))` with the final destination path once a file
    /// completes, `Ok(None)` otherwise.
    pub async fn accept(
        &self,
        chunk: Chunk,
        destination: &dyn StorageProvider,
        dest_container: &str,
    ) -> Result<Option<PathBuf>, FederatorError> {
        let name = Self::sanitised_name(&chunk);
        let key = AssemblyKey {
            file_name: name.clone(),
            sequence_id: chunk.file_sequence_id,
        };

        tokio::fs::create_dir_all(self.parts_dir())
            .await
            .map_err(|e| FederatorError::transient(format!("creating parts dir: {e}")))?;

        let part_path = {
            let mut open = self.open.lock().unwrap();
            open.entry(key.clone())
                .or_insert_with(|| OpenAssembly {
                    part_path: self
                        .parts_dir()
                        .join(format!("{name}.{}.part", chunk.file_sequence_id)),
                    bytes_written: 0,
                })
                .part_path
                .clone()
        };

        if !chunk.is_last_chunk {
            // A restarted transfer re-emits from chunk-index 0 (`spec.md §8`
            // scenario 4); truncate any stale bytes a prior, interrupted
            // attempt left behind instead of appending past them.
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(chunk.chunk_index == 0)
                .append(chunk.chunk_index != 0)
                .open(&part_path)
                .await
                .map_err(|e| FederatorError::transient(format!("opening {}: {e}", part_path.display())))?;
            file.write_all(&chunk.chunk_data)
                .await
                .map_err(|e| FederatorError::transient(format!("writing {}: {e}", part_path.display())))?;
            let mut open = self.open.lock().unwrap();
            let entry = open.get_mut(&key).expect("inserted above");
            if chunk.chunk_index == 0 {
                entry.bytes_written = 0;
            }
            entry.bytes_written += chunk.chunk_data.len() as u64;
            return Ok(None);
        }

        let bytes_written = {
            let open = self.open.lock().unwrap();
            open.get(&key).map(|e| e.bytes_written).unwrap_or(0)
        };

        if let Some(expected) = &chunk.file_checksum {
            let actual = sha256_of_file(&part_path).await?;
            if &actual != expected {
                let _ = tokio::fs::remove_file(&part_path).await;
                self.open.lock().unwrap().remove(&key);
                return Err(FederatorError::Integrity(format!(
                    "checksum mismatch for {name}: expected {expected}, got {actual}"
                )));
            }
        }
        if chunk.file_size >= 0 && bytes_written != chunk.file_size as u64 {
            let _ = tokio::fs::remove_file(&part_path).await;
            self.open.lock().unwrap().remove(&key);
            return Err(FederatorError::Integrity(format!(
                "size mismatch for {name}: expected {}, wrote {bytes_written}",
                chunk.file_size
            )));
        }

        let final_path = self.temp_dir.join(&name);
        match tokio::fs::rename(&part_path, &final_path).await {
            Ok(()) => {}
            Err(_) => {
                tokio::fs::copy(&part_path, &final_path)
                    .await
                    .map_err(|e| FederatorError::transient(format!("finalising {name}: {e}")))?;
                let _ = tokio::fs::remove_file(&part_path).await;
            }
        }
        self.open.lock().unwrap().remove(&key);

        destination.upload(dest_container, &name, &final_path).await?;
        Ok(Some(final_path))
    }
}

async fn sha256_of_file(path: &Path) -> Result<String, FederatorError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FederatorError::transient(format!("reading {}: {e}", path.display())))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorageProvider;

    fn data_chunk(name: &str, index: i32, data: &[u8], size: i64) -> Chunk {
        Chunk {
            file_name: name.into(),
            chunk_data: data.to_vec(),
            chunk_index: index,
            total_chunks: 2,
            is_last_chunk: false,
            file_checksum: None,
            file_size: size,
            file_sequence_id: 1,
        }
    }

    #[tokio::test]
    async fn assembles_and_uploads_a_valid_file() {
        let work = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let assembler = FileAssembler::new(work.path());

        let mut hasher = Sha256::new();
        hasher.update(b"hello world");
        let checksum = hex::encode(hasher.finalize());

        assembler
            .accept(
                data_chunk("report.csv", 0, b"hello world", 11),
                &LocalStorageProvider,
                dest.path().to_str().unwrap(),
            )
            .await
            .unwrap();

        let last = Chunk {
            file_name: "report.csv".into(),
            chunk_data: vec![],
            chunk_index: 1,
            total_chunks: 2,
            is_last_chunk: true,
            file_checksum: Some(checksum),
            file_size: 11,
            file_sequence_id: 1,
        };
        let result = assembler
            .accept(last, &LocalStorageProvider, dest.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(result.is_some());
        assert!(dest.path().join("report.csv").exists());
    }

    #[tokio::test]
    async fn checksum_mismatch_is_rejected_and_cleaned_up() {
        let work = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let assembler = FileAssembler::new(work.path());

        assembler
            .accept(
                data_chunk("report.csv", 0, b"hello world", 11),
                &LocalStorageProvider,
                dest.path().to_str().unwrap(),
            )
            .await
            .unwrap();

        let last = Chunk {
            file_name: "report.csv".into(),
            chunk_data: vec![],
            chunk_index: 1,
            total_chunks: 2,
            is_last_chunk: true,
            file_checksum: Some("deadbeef".into()),
            file_size: 11,
            file_sequence_id: 1,
        };
        let result = assembler
            .accept(last, &LocalStorageProvider, dest.path().to_str().unwrap())
            .await;
        assert!(matches!(result, Err(FederatorError::Integrity(_))));
        assert!(!dest.path().join("report.csv").exists());
    }

    #[tokio::test]
    async fn file_name_is_reduced_to_last_path_component() {
        let work = tempfile::tempdir().unwrap();
        let chunk = data_chunk("../../etc/passwd", 0, b"x", 1);
        assert_eq!(FileAssembler::sanitised_name(&chunk), "passwd");
        drop(work);
    }
}
