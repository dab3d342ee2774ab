use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Circle drawn on an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: i64,
    pub image_id: i64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewAnnotation {
    pub image_id: i64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}
