//! Binary object storage for uploaded images and thumbnails.

pub mod local;
pub mod memory;
pub mod signer;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use local::LocalBucket;
pub use memory::MemoryBucket;
pub use signer::UrlSigner;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object name: {0}")]
    InvalidName(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid upload signature")]
    InvalidSignature,

    #[error("Upload URL expired")]
    Expired,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// URL the object can be fetched from without credentials
    fn public_url(&self, name: &str) -> String;

    /// Time-limited URL that accepts a `PUT` of the object body
    fn signed_upload_url(&self, name: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Check a signature produced by `signed_upload_url`
    fn verify_upload(&self, name: &str, expires: i64, signature: &str) -> Result<(), StorageError>;

    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove an object; removing a missing object succeeds
    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Object names are flat: ASCII alphanumerics, `.`, `_` and `-`, no leading dot.
pub fn validate_object_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

/// Best-effort content type from the file extension
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
