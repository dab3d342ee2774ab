use axum::extract::State;

use crate::api::{ApiResponse, ApiResult, PathParam, QueryParams};
use crate::auth::ClientKey;
use crate::handlers::ShareQuery;
use crate::services::ListChatMessagesResponse;
use crate::state::AppState;

/// GET /annotations/:annotationId/messages?shareToken= - oldest first
pub async fn get(
    State(state): State<AppState>,
    client: ClientKey,
    PathParam(annotation_id): PathParam<i64>,
    QueryParams(query): QueryParams<ShareQuery>,
) -> ApiResult<ListChatMessagesResponse> {
    let list = state
        .service
        .list_chat_messages(&client, annotation_id, query.share_token.as_deref())
        .await?;
    Ok(ApiResponse::success(list))
}
