use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{validate_object_name, ObjectStore, StorageError, UrlSigner};

/// Bucket held in memory, for tests
pub struct MemoryBucket {
    signer: UrlSigner,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBucket {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            signer,
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.objects.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryBucket {
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
        validate_object_name(name)?;
        self.objects.write().await.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        validate_object_name(name)?;
        self.objects
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        validate_object_name(name)?;
        self.objects.write().await.remove(name);
        Ok(())
    }
}
