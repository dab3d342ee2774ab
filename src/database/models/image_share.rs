use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// At most one per image
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImageShare {
    pub image_id: i64,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
}
