//! `StorageProvider` (`spec.md §4.7`, `§4.8`): the seam between the file
//! pipeline and the three source/destination backends named in
//! `spec.md §1`'s out-of-scope list. Local disk is fully implemented since
//! it needs no external system; S3 and Azure are thin adapters whose
//! bodies are intentionally out of scope (`spec.md §1`: "the object-store
//! backends ... Their contracts are specified only where the core
//! consumes or produces them").

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncRead;

use fed_ore::FederatorError;

/// An open byte source plus its total size, as required to compute
/// `total_chunks` (`spec.md §4.7` step 2).
pub struct OpenedSource {
    pub reader: Box<dyn AsyncRead + Unpin + Send>,
    pub size: u64,
}

impl std::fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSource")
            .field("size", &self.size)
            .finish()
    }
}

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Opens `path` within `container` for reading.
    async fn open(&self, container: &str, path: &str) -> Result<OpenedSource, FederatorError>;

    /// Uploads the finalised local file at `local_path` to `path` within
    /// `container`.
    async fn upload(
        &self,
        container: &str,
        path: &str,
        local_path: &Path,
    ) -> Result<(), FederatorError>;
}

/// Reads from and writes to the local filesystem, rooted at `container` as
/// a directory. The in-scope provider: no external system to reach.
pub struct LocalStorageProvider;

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    async fn open(&self, container: &str, path: &str) -> Result<OpenedSource, FederatorError> {
        let full = Path::new(container).join(path);
        let file = File::open(&full)
            .await
            .map_err(|e| FederatorError::transient(format!("opening {}: {e}", full.display())))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| FederatorError::transient(format!("stat {}: {e}", full.display())))?
            .len();
        Ok(OpenedSource {
            reader: Box::new(file),
            size,
        })
    }

    async fn upload(
        &self,
        container: &str,
        path: &str,
        local_path: &Path,
    ) -> Result<(), FederatorError> {
        let dest = Path::new(container).join(path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FederatorError::transient(format!("creating {}: {e}", parent.display())))?;
        }
        tokio::fs::copy(local_path, &dest)
            .await
            .map_err(|e| FederatorError::transient(format!("copying to {}: {e}", dest.display())))?;
        let _ = tokio::fs::remove_file(local_path).await;
        Ok(())
    }
}

/// Out-of-scope adapter: the real implementation needs an S3 SDK client,
/// which is outside this system's contract (`spec.md §1`).
pub struct S3StorageProvider {
    pub bucket: String,
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    async fn open(&self, _container: &str, _path: &str) -> Result<OpenedSource, FederatorError> {
        Err(FederatorError::Configuration(format!(
            "S3 bucket {}: provider requires an SDK client, out of scope here",
            self.bucket
        )))
    }

    async fn upload(&self, _container: &str, _path: &str, _local_path: &Path) -> Result<(), FederatorError> {
        Err(FederatorError::Configuration(format!(
            "S3 bucket {}: provider requires an SDK client, out of scope here",
            self.bucket
        )))
    }
}

/// Out-of-scope adapter, mirroring [`S3StorageProvider`] for Azure Blob
/// Storage.
pub struct AzureStorageProvider {
    pub account: String,
}

#[async_trait]
impl StorageProvider for AzureStorageProvider {
    async fn open(&self, _container: &str, _path: &str) -> Result<OpenedSource, FederatorError> {
        Err(FederatorError::Configuration(format!(
            "Azure account {}: provider requires an SDK client, out of scope here",
            self.account
        )))
    }

    async fn upload(&self, _container: &str, _path: &str, _local_path: &Path) -> Result<(), FederatorError> {
        Err(FederatorError::Configuration(format!(
            "Azure account {}: provider requires an SDK client, out of scope here",
            self.account
        )))
    }
}

/// Resolves a [`fed_types::SourceKind`] to its provider.
pub fn provider_for(kind: fed_types::SourceKind, s3_bucket: &str, azure_account: &str) -> Box<dyn StorageProvider> {
    match kind {
        fed_types::SourceKind::Local => Box::new(LocalStorageProvider),
        fed_types::SourceKind::S3 => Box::new(S3StorageProvider {
            bucket: s3_bucket.to_string(),
        }),
        fed_types::SourceKind::Azure => Box::new(AzureStorageProvider {
            account: azure_account.to_string(),
        }),
    }
}
