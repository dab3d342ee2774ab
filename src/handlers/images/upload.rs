// handlers/images/upload.rs - POST /images/upload and POST /images

use axum::extract::State;

use crate::api::{ApiResponse, ApiResult, JsonBody};
use crate::auth::ClientKey;
use crate::services::{DirectUploadRequest, DirectUploadResponse, UploadImageRequest, UploadImageResponse};
use crate::state::AppState;

/// POST /images/upload - register an image, respond with signed upload URLs
///
/// The client PUTs the file body to `uploadUrl` (and optionally a thumbnail
/// to `thumbnailUploadUrl`) within the URL's lifetime.
pub async fn signed(
    State(state): State<AppState>,
    client: ClientKey,
    JsonBody(body): JsonBody<UploadImageRequest>,
) -> ApiResult<UploadImageResponse> {
    let created = state.service.upload_image(&client, body).await?;
    Ok(ApiResponse::created(created))
}

/// POST /images - upload the file inline as base64
pub async fn direct(
    State(state): State<AppState>,
    client: ClientKey,
    JsonBody(body): JsonBody<DirectUploadRequest>,
) -> ApiResult<DirectUploadResponse> {
    let created = state.service.direct_upload(&client, body).await?;
    Ok(ApiResponse::created(created))
}
