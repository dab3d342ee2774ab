use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Annotation, ChatMessage, Image, ImageShare, NewAnnotation, NewImage, UserImageRow};

/// Keyed reads and inserts over images, shares, annotations and chat messages.
///
/// Lookups return `Ok(None)` for missing rows; only connectivity or query
/// failures surface as errors.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn insert_image(&self, image: NewImage) -> Result<Image, DatabaseError>;

    async fn get_image(&self, image_id: i64) -> Result<Option<Image>, DatabaseError>;

    /// Owner key recorded when the image was created
    async fn image_owner(&self, image_id: i64) -> Result<Option<String>, DatabaseError>;

    /// Share row for `image_id` whose token equals `token`
    async fn find_share(&self, image_id: i64, token: &str) -> Result<Option<ImageShare>, DatabaseError>;

    async fn share_for_image(&self, image_id: i64) -> Result<Option<ImageShare>, DatabaseError>;

    /// Insert a share for the image, or return the one that already exists.
    async fn insert_share(&self, image_id: i64, token: &str) -> Result<ImageShare, DatabaseError>;

    async fn insert_annotation(&self, annotation: NewAnnotation) -> Result<Annotation, DatabaseError>;

    async fn get_annotation(&self, annotation_id: i64) -> Result<Option<Annotation>, DatabaseError>;

    /// Oldest first
    async fn list_annotations(&self, image_id: i64) -> Result<Vec<Annotation>, DatabaseError>;

    async fn insert_chat_message(&self, annotation_id: i64, message: &str) -> Result<ChatMessage, DatabaseError>;

    /// Oldest first
    async fn list_chat_messages(&self, annotation_id: i64) -> Result<Vec<ChatMessage>, DatabaseError>;

    /// Images owned by `owner_key`, newest first
    async fn list_user_images(&self, owner_key: &str) -> Result<Vec<UserImageRow>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
