use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub thumbnail_filename: Option<String>,
    /// Client key of the uploader
    pub user_ip: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub original_filename: String,
    pub thumbnail_filename: Option<String>,
    pub user_ip: String,
}

/// Owner's image listing row with its annotation count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserImageRow {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub thumbnail_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub annotation_count: i64,
}
