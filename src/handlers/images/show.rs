use axum::extract::State;

use crate::api::{ApiResponse, ApiResult, PathParam, QueryParams};
use crate::auth::ClientKey;
use crate::handlers::ShareQuery;
use crate::services::ImageView;
use crate::state::AppState;

/// GET /images/:id?shareToken= - image metadata with the caller's edit right
pub async fn get(
    State(state): State<AppState>,
    client: ClientKey,
    PathParam(image_id): PathParam<i64>,
    QueryParams(query): QueryParams<ShareQuery>,
) -> ApiResult<ImageView> {
    let image = state
        .service
        .get_image(&client, image_id, query.share_token.as_deref())
        .await?;
    Ok(ApiResponse::success(image))
}
