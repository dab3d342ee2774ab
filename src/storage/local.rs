use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{validate_object_name, ObjectStore, StorageError, UrlSigner};

/// Objects stored as flat files under one directory
pub struct LocalBucket {
    root: PathBuf,
    signer: UrlSigner,
}

impl LocalBucket {
    /// Create the bucket, making the root directory if needed
    pub async fn open(root: impl AsRef<Path>, signer: UrlSigner) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), "Opened local image bucket");
        Ok(Self { root, signer })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_object_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ObjectStore for LocalBucket {
    fn public_url(&self, name: &str) -> String {
        self.signer.public_url(name)
    }

    fn signed_upload_url(&self, name: &str, ttl: Duration) -> Result<String, StorageError> {
        self.signer.signed_upload_url(name, ttl)
    }

    fn verify_upload(&self, name: &str, expires: i64, signature: &str) -> Result<(), StorageError> {
        self.signer.verify(name, expires, signature)
    }

    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        // Write then rename so readers never see a partial object
        let tmp = self.root.join(format!(".{}.partial", name));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(object = name, size = bytes.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
