use axum::extract::State;

use crate::api::{ApiResponse, ApiResult, JsonBody, PathParam};
use crate::auth::ClientKey;
use crate::database::models::ChatMessage;
use crate::services::AddChatMessageRequest;
use crate::state::AppState;

/// POST /annotations/:annotationId/messages - counted against the chat limiter
pub async fn post(
    State(state): State<AppState>,
    client: ClientKey,
    PathParam(annotation_id): PathParam<i64>,
    JsonBody(body): JsonBody<AddChatMessageRequest>,
) -> ApiResult<ChatMessage> {
    let message = state.service.add_chat_message(&client, annotation_id, body).await?;
    Ok(ApiResponse::created(message))
}
