use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Annotation, ChatMessage, Image, ImageShare, NewAnnotation, NewImage, UserImageRow};
use crate::database::store::AnnotationStore;

/// `AnnotationStore` backed by Postgres
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AnnotationStore for PgStore {
    async fn insert_image(&self, image: NewImage) -> Result<Image, DatabaseError> {
        let row = sqlx::query_as::<_, Image>(
            "INSERT INTO images (filename, original_filename, thumbnail_filename, user_ip)
             VALUES ($1, $2, $3, $4)
             RETURNING id, filename, original_filename, thumbnail_filename, user_ip, created_at",
        )
        .bind(&image.filename)
        .bind(&image.original_filename)
        .bind(&image.thumbnail_filename)
        .bind(&image.user_ip)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_image(&self, image_id: i64) -> Result<Option<Image>, DatabaseError> {
        let row = sqlx::query_as::<_, Image>(
            "SELECT id, filename, original_filename, thumbnail_filename, user_ip, created_at
             FROM images
             WHERE id = $1",
        )
        .bind(image_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn image_owner(&self, image_id: i64) -> Result<Option<String>, DatabaseError> {
        let owner = sqlx::query_scalar::<_, String>("SELECT user_ip FROM images WHERE id = $1")
            .bind(image_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }

    async fn find_share(&self, image_id: i64, token: &str) -> Result<Option<ImageShare>, DatabaseError> {
        let row = sqlx::query_as::<_, ImageShare>(
            "SELECT image_id, share_token, created_at
             FROM image_shares
             WHERE image_id = $1 AND share_token = $2",
        )
        .bind(image_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn share_for_image(&self, image_id: i64) -> Result<Option<ImageShare>, DatabaseError> {
        let row = sqlx::query_as::<_, ImageShare>(
            "SELECT image_id, share_token, created_at FROM image_shares WHERE image_id = $1",
        )
        .bind(image_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_share(&self, image_id: i64, token: &str) -> Result<ImageShare, DatabaseError> {
        let inserted = sqlx::query_as::<_, ImageShare>(
            "INSERT INTO image_shares (image_id, share_token)
             VALUES ($1, $2)
             ON CONFLICT (image_id) DO NOTHING
             RETURNING image_id, share_token, created_at",
        )
        .bind(image_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(share) = inserted {
            return Ok(share);
        }

        // Lost a race with a concurrent insert for the same image
        self.share_for_image(image_id)
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("share for image {} vanished after conflict", image_id)))
    }

    async fn insert_annotation(&self, annotation: NewAnnotation) -> Result<Annotation, DatabaseError> {
        let row = sqlx::query_as::<_, Annotation>(
            "INSERT INTO annotations (image_id, x, y, radius)
             VALUES ($1, $2, $3, $4)
             RETURNING id, image_id, x, y, radius, created_at",
        )
        .bind(annotation.image_id)
        .bind(annotation.x)
        .bind(annotation.y)
        .bind(annotation.radius)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_annotation(&self, annotation_id: i64) -> Result<Option<Annotation>, DatabaseError> {
        let row = sqlx::query_as::<_, Annotation>(
            "SELECT id, image_id, x, y, radius, created_at FROM annotations WHERE id = $1",
        )
        .bind(annotation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_annotations(&self, image_id: i64) -> Result<Vec<Annotation>, DatabaseError> {
        let rows = sqlx::query_as::<_, Annotation>(
            "SELECT id, image_id, x, y, radius, created_at
             FROM annotations
             WHERE image_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(image_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_chat_message(&self, annotation_id: i64, message: &str) -> Result<ChatMessage, DatabaseError> {
        let row = sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages (annotation_id, message)
             VALUES ($1, $2)
             RETURNING id, annotation_id, message, created_at",
        )
        .bind(annotation_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_chat_messages(&self, annotation_id: i64) -> Result<Vec<ChatMessage>, DatabaseError> {
        let rows = sqlx::query_as::<_, ChatMessage>(
            "SELECT id, annotation_id, message, created_at
             FROM chat_messages
             WHERE annotation_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(annotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_user_images(&self, owner_key: &str) -> Result<Vec<UserImageRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserImageRow>(
            r#"
            SELECT
                i.id,
                i.filename,
                i.original_filename,
                i.thumbnail_filename,
                i.created_at,
                COUNT(a.id) AS annotation_count
            FROM images i
            LEFT JOIN annotations a ON i.id = a.image_id
            WHERE i.user_ip = $1
            GROUP BY i.id, i.filename, i.original_filename, i.thumbnail_filename, i.created_at
            ORDER BY i.created_at DESC, i.id DESC
            "#,
        )
        .bind(owner_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
