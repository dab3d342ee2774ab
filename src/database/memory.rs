//! In-process `AnnotationStore` used by tests and local experiments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::database::manager::DatabaseError;
use crate::database::models::{Annotation, ChatMessage, Image, ImageShare, NewAnnotation, NewImage, UserImageRow};
use crate::database::store::AnnotationStore;

#[derive(Default)]
struct Tables {
    next_id: i64,
    images: Vec<Image>,
    shares: HashMap<i64, ImageShare>,
    annotations: Vec<Annotation>,
    messages: Vec<ChatMessage>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Total chat messages across all annotations
    pub async fn message_count(&self) -> usize {
        self.tables.read().await.messages.len()
    }

    pub async fn image_count(&self) -> usize {
        self.tables.read().await.images.len()
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    async fn insert_image(&self, image: NewImage) -> Result<Image, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.images.iter().any(|i| i.filename == image.filename) {
            return Err(DatabaseError::QueryError(format!("duplicate filename {}", image.filename)));
        }
        let row = Image {
            id: tables.next_id(),
            filename: image.filename,
            original_filename: image.original_filename,
            thumbnail_filename: image.thumbnail_filename,
            user_ip: image.user_ip,
            created_at: self.clock.now(),
        };
        tables.images.push(row.clone());
        Ok(row)
    }

    async fn get_image(&self, image_id: i64) -> Result<Option<Image>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.images.iter().find(|i| i.id == image_id).cloned())
    }

    async fn image_owner(&self, image_id: i64) -> Result<Option<String>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.images.iter().find(|i| i.id == image_id).map(|i| i.user_ip.clone()))
    }

    async fn find_share(&self, image_id: i64, token: &str) -> Result<Option<ImageShare>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .shares
            .get(&image_id)
            .filter(|s| s.share_token == token)
            .cloned())
    }

    async fn share_for_image(&self, image_id: i64) -> Result<Option<ImageShare>, DatabaseError> {
        Ok(self.tables.read().await.shares.get(&image_id).cloned())
    }

    async fn insert_share(&self, image_id: i64, token: &str) -> Result<ImageShare, DatabaseError> {
        let now = self.clock.now();
        let mut tables = self.tables.write().await;
        if !tables.images.iter().any(|i| i.id == image_id) {
            return Err(DatabaseError::QueryError(format!("image {} does not exist", image_id)));
        }
        let share = tables.shares.entry(image_id).or_insert_with(|| ImageShare {
            image_id,
            share_token: token.to_string(),
            created_at: now,
        });
        Ok(share.clone())
    }

    async fn insert_annotation(&self, annotation: NewAnnotation) -> Result<Annotation, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.images.iter().any(|i| i.id == annotation.image_id) {
            return Err(DatabaseError::QueryError(format!("image {} does not exist", annotation.image_id)));
        }
        let row = Annotation {
            id: tables.next_id(),
            image_id: annotation.image_id,
            x: annotation.x,
            y: annotation.y,
            radius: annotation.radius,
            created_at: self.clock.now(),
        };
        tables.annotations.push(row.clone());
        Ok(row)
    }

    async fn get_annotation(&self, annotation_id: i64) -> Result<Option<Annotation>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.annotations.iter().find(|a| a.id == annotation_id).cloned())
    }

    async fn list_annotations(&self, image_id: i64) -> Result<Vec<Annotation>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Annotation> = tables
            .annotations
            .iter()
            .filter(|a| a.image_id == image_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.created_at, a.id));
        Ok(rows)
    }

    async fn insert_chat_message(&self, annotation_id: i64, message: &str) -> Result<ChatMessage, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.annotations.iter().any(|a| a.id == annotation_id) {
            return Err(DatabaseError::QueryError(format!("annotation {} does not exist", annotation_id)));
        }
        let row = ChatMessage {
            id: tables.next_id(),
            annotation_id,
            message: message.to_string(),
            created_at: self.clock.now(),
        };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn list_chat_messages(&self, annotation_id: i64) -> Result<Vec<ChatMessage>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ChatMessage> = tables
            .messages
            .iter()
            .filter(|m| m.annotation_id == annotation_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        Ok(rows)
    }

    async fn list_user_images(&self, owner_key: &str) -> Result<Vec<UserImageRow>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<UserImageRow> = tables
            .images
            .iter()
            .filter(|i| i.user_ip == owner_key)
            .map(|i| UserImageRow {
                id: i.id,
                filename: i.filename.clone(),
                original_filename: i.original_filename.clone(),
                thumbnail_filename: i.thumbnail_filename.clone(),
                created_at: i.created_at,
                annotation_count: tables.annotations.iter().filter(|a| a.image_id == i.id).count() as i64,
            })
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
