//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Provides async file I/O operations using:
/// - `tokio::fs` for async operations
/// - The platform's user documents directory (via `dirs`)
pub struct TokioFileSystem {
    documents_dir: PathBuf,
}

impl TokioFileSystem {
    /// Create a new file system accessor rooted at the platform documents
    /// directory
    pub fn new() -> Self {
        let documents_dir = dirs::document_dir()
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("media-cache");

        Self { documents_dir }
    }

    /// Create a new file system accessor with a custom documents directory
    pub fn with_documents_directory(documents_dir: PathBuf) -> Self {
        Self { documents_dir }
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn get_documents_directory(&self) -> Result<PathBuf> {
        if !fs::try_exists(&self.documents_dir)
            .await
            .map_err(Self::map_io_error)?
        {
            fs::create_dir_all(&self.documents_dir)
                .await
                .map_err(Self::map_io_error)?;
            debug!(path = ?self.documents_dir, "Created documents directory");
        }
        Ok(self.documents_dir.clone())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_dir() -> PathBuf {
        env::temp_dir().join(format!("bridge-desktop-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_documents_directory_is_created() {
        let root = scratch_dir();
        let fs = TokioFileSystem::with_documents_directory(root.clone());

        let documents = fs.get_documents_directory().await.unwrap();
        assert_eq!(documents, root);
        assert!(fs.exists(&root).await.unwrap());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_overwrites_and_reads_back() {
        let root = scratch_dir();
        let fs = TokioFileSystem::with_documents_directory(root.clone());
        let file = root.join("nested").join("clip.mp4");

        fs.write_file(&file, Bytes::from("first version")).await.unwrap();
        fs.write_file(&file, Bytes::from("second")).await.unwrap();

        assert_eq!(fs.read_file(&file).await.unwrap(), Bytes::from("second"));
        assert_eq!(fs.metadata(&file).await.unwrap().size, 6);

        fs.delete_file(&file).await.unwrap();
        assert!(!fs.exists(&file).await.unwrap());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_io_error() {
        let fs = TokioFileSystem::with_documents_directory(scratch_dir());
        let result = fs.delete_file(&scratch_dir().join("missing.mp4")).await;
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }
}
