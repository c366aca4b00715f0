//! Local-directory blob store.
//!
//! The bucket identifier is a directory path and object paths are relative
//! to it, mirroring the `users/{uid}/audio/{noteId}.m4a` layout of the
//! hosted bucket.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::BlobStore;

#[derive(Debug, Default)]
pub struct LocalBlobStore;

impl LocalBlobStore {
    pub fn new() -> Self {
        Self
    }

    fn object_path(bucket: &str, path: &str) -> PathBuf {
        Path::new(bucket).join(path)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn download(&self, bucket: &str, path: &str, dest: &Path) -> Result<u64> {
        let source = Self::object_path(bucket, path);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = tokio::fs::copy(&source, dest)
            .await
            .with_context(|| format!("Failed to download object {}", source.display()))?;

        Ok(bytes)
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<()> {
        let object = Self::object_path(bucket, path);

        match tokio::fs::remove_file(&object).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete object {}", object.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_download_copies_object() {
        let bucket = TempDir::new().unwrap();
        let object_dir = bucket.path().join("users/u1/audio");
        tokio::fs::create_dir_all(&object_dir).await.unwrap();
        tokio::fs::write(object_dir.join("note1.m4a"), b"audio bytes")
            .await
            .unwrap();

        let scratch = TempDir::new().unwrap();
        let dest = scratch.path().join("note1.m4a");

        let store = LocalBlobStore::new();
        let size = store
            .download(
                bucket.path().to_str().unwrap(),
                "users/u1/audio/note1.m4a",
                &dest,
            )
            .await
            .unwrap();

        assert_eq!(size, 11);
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_download_missing_object_fails() {
        let bucket = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();

        let store = LocalBlobStore::new();
        let result = store
            .download(
                bucket.path().to_str().unwrap(),
                "users/u1/audio/gone.m4a",
                &scratch.path().join("gone.m4a"),
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let bucket = TempDir::new().unwrap();
        let store = LocalBlobStore::new();

        store
            .delete(bucket.path().to_str().unwrap(), "users/u1/audio/gone.m4a")
            .await
            .unwrap();
    }
}
