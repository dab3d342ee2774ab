// handlers/public.rs - service index and health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Annotation API",
            "version": version,
            "endpoints": {
                "upload": "POST /images/upload, POST /images",
                "images": "GET /images/:id, POST /images/:imageId/share",
                "annotations": "POST /annotations, GET /images/:imageId/annotations",
                "messages": "POST|GET /annotations/:annotationId/messages",
                "user": "GET /user/images",
                "bucket": "GET|PUT /bucket/:name",
            }
        }
    }))
}

/// GET /health - liveness plus a storage ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.service.store().health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "rate_limit_windows": state.service.limiter().len(),
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}
