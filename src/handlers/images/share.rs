use axum::extract::State;

use crate::api::{ApiResponse, ApiResult, PathParam};
use crate::auth::ClientKey;
use crate::services::ShareLinkResponse;
use crate::state::AppState;

/// POST /images/:imageId/share - owner only; repeat calls return the same token
pub async fn post(
    State(state): State<AppState>,
    client: ClientKey,
    PathParam(image_id): PathParam<i64>,
) -> ApiResult<ShareLinkResponse> {
    let link = state.service.create_share_link(&client, image_id).await?;
    Ok(ApiResponse::success(link))
}
