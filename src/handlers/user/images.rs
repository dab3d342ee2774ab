use axum::extract::State;

use crate::api::{ApiResponse, ApiResult};
use crate::auth::ClientKey;
use crate::services::ListUserImagesResponse;
use crate::state::AppState;

/// GET /user/images - the caller's uploads, newest first
pub async fn get(State(state): State<AppState>, client: ClientKey) -> ApiResult<ListUserImagesResponse> {
    let list = state.service.list_user_images(&client).await?;
    Ok(ApiResponse::success(list))
}
