use axum::extract::State;

use crate::api::{ApiResponse, ApiResult, PathParam, QueryParams};
use crate::auth::ClientKey;
use crate::handlers::ShareQuery;
use crate::services::ListAnnotationsResponse;
use crate::state::AppState;

/// GET /images/:imageId/annotations?shareToken= - oldest first
pub async fn get(
    State(state): State<AppState>,
    client: ClientKey,
    PathParam(image_id): PathParam<i64>,
    QueryParams(query): QueryParams<ShareQuery>,
) -> ApiResult<ListAnnotationsResponse> {
    let list = state
        .service
        .list_annotations(&client, image_id, query.share_token.as_deref())
        .await?;
    Ok(ApiResponse::success(list))
}
