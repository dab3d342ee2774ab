use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

use super::{validate_object_name, StorageError};
use crate::clock::Clock;

type HmacSha256 = Hmac<Sha256>;

/// Builds public and signed upload URLs under `{base_url}/bucket/`.
///
/// Signature is hex HMAC-SHA256 over `"{name}:{expires}"`, `expires` being
/// Unix seconds.
#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    secret: String,
    clock: Arc<dyn Clock>,
}

impl UrlSigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            clock,
        }
    }

    pub fn public_url(&self, name: &str) -> String {
        format!("{}/bucket/{}", self.base_url, name)
    }

    pub fn signed_upload_url(&self, name: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_object_name(name)?;
        let expires = self.clock.now().timestamp() + ttl.as_secs() as i64;
        let signature = self.sign(name, expires);
        Ok(format!(
            "{}?expires={}&signature={}",
            self.public_url(name),
            expires,
            signature
        ))
    }

    pub fn verify(&self, name: &str, expires: i64, signature: &str) -> Result<(), StorageError> {
        validate_object_name(name)?;
        let expected = hex::decode(signature).map_err(|_| StorageError::InvalidSignature)?;

        let mut mac = self.mac();
        mac.update(Self::message(name, expires).as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| StorageError::InvalidSignature)?;

        if self.clock.now().timestamp() >= expires {
            return Err(StorageError::Expired);
        }
        Ok(())
    }

    fn sign(&self, name: &str, expires: i64) -> String {
        let mut mac = self.mac();
        mac.update(Self::message(name, expires).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key length")
    }

    fn message(name: &str, expires: i64) -> String {
        format!("{}:{}", name, expires)
    }
}
