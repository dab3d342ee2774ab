// handlers/bucket.rs - object endpoints backing public and signed upload URLs

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::api::{ApiResponse, ApiResult, PathParam, QueryParams};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::content_type_for;

#[derive(Debug, Deserialize)]
pub struct SignedUploadQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoredObject {
    pub name: String,
    pub size: usize,
}

/// PUT /bucket/:name?expires=&signature= - accept a signed upload
pub async fn put(
    State(state): State<AppState>,
    PathParam(name): PathParam<String>,
    QueryParams(query): QueryParams<SignedUploadQuery>,
    body: Bytes,
) -> ApiResult<StoredObject> {
    let (expires, signature) = match (query.expires, query.signature.as_deref()) {
        (Some(expires), Some(signature)) => (expires, signature),
        _ => return Err(ApiError::forbidden("Upload URL is missing its signature")),
    };

    let bucket = state.service.bucket();
    bucket.verify_upload(&name, expires, signature)?;

    let max = state.service.settings().max_upload_bytes;
    if body.len() > max {
        return Err(ApiError::payload_too_large(format!("Upload exceeds the {} byte limit", max)));
    }

    bucket.put(&name, &body).await?;
    Ok(ApiResponse::success(StoredObject {
        name,
        size: body.len(),
    }))
}

/// GET /bucket/:name - serve a stored object
pub async fn get(State(state): State<AppState>, PathParam(name): PathParam<String>) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.service.bucket().get(&name).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes))
}
