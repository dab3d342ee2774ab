use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{normalize_token, AnnotationService, IMAGE_VIEW_POLICY};
use crate::auth::{enforce, require_owner, ClientKey};
use crate::database::models::{NewImage, UserImageRow};
use crate::error::ApiError;

const DEFAULT_EXTENSION: &str = "jpg";
const THUMBNAIL_PREFIX: &str = "thumb-";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub image_id: i64,
    pub upload_url: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_upload_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectUploadRequest {
    pub filename: String,
    /// Base64 payload, optionally as a `data:` URL
    pub image_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectUploadResponse {
    pub image_id: i64,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub can_edit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    pub share_token: String,
    pub share_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserImage {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub annotation_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUserImagesResponse {
    pub images: Vec<UserImage>,
}

impl AnnotationService {
    /// POST /images/upload - register an image and hand out signed upload URLs
    pub async fn upload_image(
        &self,
        client: &ClientKey,
        req: UploadImageRequest,
    ) -> Result<UploadImageResponse, ApiError> {
        let original = req.filename.trim();
        if original.is_empty() {
            return Err(ApiError::invalid_field("filename", "Filename is required"));
        }

        let filename = self.unique_object_name(original);
        let thumbnail_filename = req
            .content_type
            .trim()
            .starts_with("image/")
            .then(|| format!("{}{}", THUMBNAIL_PREFIX, filename));

        let ttl = self.settings.upload_url_ttl;
        let upload_url = self.bucket.signed_upload_url(&filename, ttl)?;
        let thumbnail_upload_url = thumbnail_filename
            .as_deref()
            .map(|name| self.bucket.signed_upload_url(name, ttl))
            .transpose()?;

        let image = self
            .store
            .insert_image(NewImage {
                filename: filename.clone(),
                original_filename: original.to_string(),
                thumbnail_filename,
                user_ip: client.as_str().to_string(),
            })
            .await?;

        tracing::info!(client = %client, image_id = image.id, object = %filename, "Registered image upload");

        Ok(UploadImageResponse {
            image_id: image.id,
            upload_url,
            image_url: self.bucket.public_url(&filename),
            thumbnail_upload_url,
        })
    }

    /// POST /images - store a base64 payload directly
    pub async fn direct_upload(
        &self,
        client: &ClientKey,
        req: DirectUploadRequest,
    ) -> Result<DirectUploadResponse, ApiError> {
        let original = req.filename.trim();
        if original.is_empty() {
            return Err(ApiError::invalid_field("filename", "Filename is required"));
        }

        let bytes = decode_image_data(&req.image_data)?;
        if bytes.is_empty() {
            return Err(ApiError::invalid_field("imageData", "Image data is empty"));
        }
        if bytes.len() > self.settings.max_upload_bytes {
            return Err(ApiError::payload_too_large(format!(
                "Image exceeds the {} byte limit",
                self.settings.max_upload_bytes
            )));
        }

        let filename = self.unique_object_name(original);
        self.bucket.put(&filename, &bytes).await?;

        let inserted = self
            .store
            .insert_image(NewImage {
                filename: filename.clone(),
                original_filename: original.to_string(),
                thumbnail_filename: None,
                user_ip: client.as_str().to_string(),
            })
            .await;
        let image = match inserted {
            Ok(image) => image,
            Err(e) => {
                // No row points at the object, so don't leave it behind
                if let Err(cleanup) = self.bucket.delete(&filename).await {
                    tracing::warn!(object = %filename, "Failed to remove orphaned object: {}", cleanup);
                }
                return Err(e.into());
            }
        };

        tracing::info!(client = %client, image_id = image.id, size = bytes.len(), "Stored uploaded image");

        Ok(DirectUploadResponse {
            image_id: image.id,
            image_url: self.bucket.public_url(&filename),
        })
    }

    /// GET /images/:id - owners and share-token holders, edit-restricted policy
    pub async fn get_image(
        &self,
        client: &ClientKey,
        image_id: i64,
        share_token: Option<&str>,
    ) -> Result<ImageView, ApiError> {
        let image = self
            .store
            .get_image(image_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Image not found"))?;

        let decision = self
            .authorizer
            .authorize(&image.user_ip, normalize_token(share_token), image.id, client)
            .await?;
        enforce(IMAGE_VIEW_POLICY, decision).inspect_err(|_| {
            tracing::debug!(client = %client, image_id, ?decision, "Image view denied");
        })?;

        Ok(ImageView {
            id: image.id,
            image_url: self.bucket.public_url(&image.filename),
            filename: image.filename,
            original_filename: image.original_filename,
            created_at: image.created_at,
            can_edit: decision.can_edit(),
        })
    }

    /// POST /images/:imageId/share - owner only, returns the existing token if any
    pub async fn create_share_link(&self, client: &ClientKey, image_id: i64) -> Result<ShareLinkResponse, ApiError> {
        let owner_key = self
            .store
            .image_owner(image_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Image not found"))?;

        let decision = self.authorizer.authorize(&owner_key, None, image_id, client).await?;
        require_owner(decision, "create share links")?;

        let share = match self.store.share_for_image(image_id).await? {
            Some(existing) => existing,
            None => {
                let token = Uuid::new_v4().simple().to_string();
                let share = self.store.insert_share(image_id, &token).await?;
                tracing::info!(client = %client, image_id, "Created share link");
                share
            }
        };

        Ok(ShareLinkResponse {
            share_url: self.share_url(image_id, &share.share_token),
            share_token: share.share_token,
        })
    }

    /// GET /user/images - images uploaded under the caller's key
    pub async fn list_user_images(&self, client: &ClientKey) -> Result<ListUserImagesResponse, ApiError> {
        let rows = self.store.list_user_images(client.as_str()).await?;
        let images = rows.into_iter().map(|row| self.user_image(row)).collect();
        Ok(ListUserImagesResponse { images })
    }

    fn user_image(&self, row: UserImageRow) -> UserImage {
        UserImage {
            id: row.id,
            image_url: self.bucket.public_url(&row.filename),
            thumbnail_url: row.thumbnail_filename.as_deref().map(|t| self.bucket.public_url(t)),
            filename: row.filename,
            original_filename: row.original_filename,
            created_at: row.created_at,
            annotation_count: row.annotation_count,
        }
    }

    fn share_url(&self, image_id: i64, token: &str) -> String {
        format!("{}/image/{}?share={}", self.settings.frontend_url, image_id, token)
    }

    /// `{epochMillis}-{random}.{ext}`
    fn unique_object_name(&self, original: &str) -> String {
        let millis = self.limiter.clock().now().timestamp_millis();
        let random = Uuid::new_v4().simple().to_string();
        format!("{}-{}.{}", millis, &random[..10], file_extension(original))
    }
}

/// Lower-cased alphanumeric extension of `filename`, `jpg` when there is none.
fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn decode_image_data(data: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|_| ApiError::invalid_field("imageData", "Image data is not valid base64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::database::models::{Annotation, ChatMessage, Image, ImageShare, NewAnnotation};
    use crate::database::{AnnotationStore, DatabaseError, MemoryStore};
    use crate::rate_limit::{RateLimitConfig, RateLimiter};
    use crate::services::ServiceSettings;
    use crate::storage::{MemoryBucket, UrlSigner};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::Arc;

    /// Store whose image inserts always fail
    struct RejectingImages(MemoryStore);

    #[async_trait]
    impl AnnotationStore for RejectingImages {
        async fn insert_image(&self, _image: NewImage) -> Result<Image, DatabaseError> {
            Err(DatabaseError::QueryError("connection reset".to_string()))
        }
        async fn get_image(&self, image_id: i64) -> Result<Option<Image>, DatabaseError> {
            self.0.get_image(image_id).await
        }
        async fn image_owner(&self, image_id: i64) -> Result<Option<String>, DatabaseError> {
            self.0.image_owner(image_id).await
        }
        async fn find_share(&self, image_id: i64, token: &str) -> Result<Option<ImageShare>, DatabaseError> {
            self.0.find_share(image_id, token).await
        }
        async fn share_for_image(&self, image_id: i64) -> Result<Option<ImageShare>, DatabaseError> {
            self.0.share_for_image(image_id).await
        }
        async fn insert_share(&self, image_id: i64, token: &str) -> Result<ImageShare, DatabaseError> {
            self.0.insert_share(image_id, token).await
        }
        async fn insert_annotation(&self, annotation: NewAnnotation) -> Result<Annotation, DatabaseError> {
            self.0.insert_annotation(annotation).await
        }
        async fn get_annotation(&self, annotation_id: i64) -> Result<Option<Annotation>, DatabaseError> {
            self.0.get_annotation(annotation_id).await
        }
        async fn list_annotations(&self, image_id: i64) -> Result<Vec<Annotation>, DatabaseError> {
            self.0.list_annotations(image_id).await
        }
        async fn insert_chat_message(&self, annotation_id: i64, message: &str) -> Result<ChatMessage, DatabaseError> {
            self.0.insert_chat_message(annotation_id, message).await
        }
        async fn list_chat_messages(&self, annotation_id: i64) -> Result<Vec<ChatMessage>, DatabaseError> {
            self.0.list_chat_messages(annotation_id).await
        }
        async fn list_user_images(&self, owner_key: &str) -> Result<Vec<UserImageRow>, DatabaseError> {
            self.0.list_user_images(owner_key).await
        }
        async fn health_check(&self) -> Result<(), DatabaseError> {
            self.0.health_check().await
        }
    }

    #[tokio::test]
    async fn failed_insert_removes_the_stored_object() {
        let clock = Arc::new(MockClock::at_epoch());
        let bucket = Arc::new(MemoryBucket::new(UrlSigner::new("http://api.test", "secret", clock.clone())));
        let service = AnnotationService::new(
            Arc::new(RejectingImages(MemoryStore::new(clock.clone()))),
            bucket.clone(),
            Arc::new(RateLimiter::new(RateLimitConfig::default(), clock)),
            ServiceSettings::default(),
        );

        let err = service
            .direct_upload(
                &ClientKey::new("1.2.3.4"),
                DirectUploadRequest {
                    filename: "cat.png".to_string(),
                    image_data: "aGVsbG8=".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(bucket.is_empty().await);
    }

    #[test]
    fn extension_falls_back_to_jpg() {
        assert_eq!(file_extension("cat.PNG"), "png");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "jpg");
        assert_eq!(file_extension("trailing."), "jpg");
        assert_eq!(file_extension("weird.p/ng"), "jpg");
    }

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        assert_eq!(decode_image_data("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_image_data("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert!(decode_image_data("***").is_err());
    }
}
