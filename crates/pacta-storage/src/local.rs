use crate::keys::generate_storage_key;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use pacta_core::StorageBackend;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/pacta/documents")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Validates that the storage key doesn't contain path traversal
    /// sequences that could escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        tenant_id: Uuid,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = generate_storage_key(tenant_id, filename);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        file.write_all(&data)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::info!(
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok((key.clone(), self.generate_url(&key)))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(e.to_string())),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage() -> (LocalStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:4000/files".to_string(),
        )
        .await
        .expect("local storage");
        (storage, dir)
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let (storage, _dir) = test_storage().await;
        let tenant_id = Uuid::new_v4();

        let (key, url) = storage
            .upload(tenant_id, "a1.pdf", "application/pdf", b"%PDF-1.4 test".to_vec())
            .await
            .expect("upload");

        assert_eq!(key, format!("documents/{}/a1.pdf", tenant_id));
        assert!(url.ends_with(&key));

        let data = storage.download(&key).await.expect("download");
        assert_eq!(data, b"%PDF-1.4 test");
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let (storage, _dir) = test_storage().await;
        let err = storage
            .download("documents/missing.pdf")
            .await
            .expect_err("should be missing");
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_then_exists() {
        let (storage, _dir) = test_storage().await;
        let tenant_id = Uuid::new_v4();

        let (key, _) = storage
            .upload(tenant_id, "a2.pdf", "application/pdf", b"data".to_vec())
            .await
            .expect("upload");

        assert!(storage.exists(&key).await.expect("exists"));
        storage.delete(&key).await.expect("delete");
        assert!(!storage.exists(&key).await.expect("exists"));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (storage, _dir) = test_storage().await;
        let err = storage
            .download("../../etc/passwd")
            .await
            .expect_err("traversal must be rejected");
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
