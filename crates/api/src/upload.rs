//! Local-disk [`UploadSink`].
//!
//! Files are written flat under a single root directory. Stored paths are
//! bare file names; anything else is refused on read and remove.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fleetdocs_core::upload::{
    check_upload_policy, stored_file_name, StoredFileHandle, UploadError, UploadRequest,
    UploadSink,
};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Stores attachments in a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDiskSink {
    root: PathBuf,
}

impl LocalDiskSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a stored file, or `None` for a path that is not
    /// a bare file name.
    pub fn resolve(&self, stored_path: &str) -> Option<PathBuf> {
        let name = Path::new(stored_path).file_name()?;
        (name == stored_path).then(|| self.root.join(name))
    }

    /// Read a stored file back.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub async fn read(&self, stored_path: &str) -> Result<Option<Vec<u8>>, UploadError> {
        let Some(path) = self.resolve(stored_path) else {
            return Ok(None);
        };
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(UploadError::StorageFailure(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Write through a `.part` sibling and rename into place.
    ///
    /// The temporary file is removed on every failure after it was created.
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await?;

        let temp_path = path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;
        let written = async {
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, path).await
        }
        .await;

        if written.is_err() {
            if let Err(e) = fs::remove_file(&temp_path).await {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "Failed to remove partial upload"
                );
            }
        }
        written
    }
}

#[async_trait]
impl UploadSink for LocalDiskSink {
    async fn store(
        &self,
        request: UploadRequest,
        max_size_bytes: u64,
    ) -> Result<StoredFileHandle, UploadError> {
        let size = request.payload.len() as u64;
        let mime_type = check_upload_policy(&request.declared_mime_type, size, max_size_bytes)?;

        let unique = uuid::Uuid::now_v7().simple().to_string();
        let file_name = stored_file_name(&request.original_name, &unique);
        let path = self.root.join(&file_name);

        self.write_atomic(&path, &request.payload).await.map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write upload");
            UploadError::StorageFailure(format!("write {}: {e}", path.display()))
        })?;

        tracing::debug!(stored_path = %file_name, size, "Upload stored");
        Ok(StoredFileHandle {
            stored_path: file_name,
            original_name: request.original_name,
            mime_type,
            size_bytes: size as i64,
        })
    }

    async fn remove(&self, stored_path: &str) -> Result<(), UploadError> {
        let path = self.resolve(stored_path).ok_or_else(|| {
            UploadError::StorageFailure(format!("refusing to remove '{stored_path}'"))
        })?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UploadError::StorageFailure(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }
}
