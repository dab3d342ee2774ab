use axum::extract::State;

use crate::api::{ApiResponse, ApiResult, JsonBody};
use crate::auth::ClientKey;
use crate::database::models::Annotation;
use crate::services::CreateAnnotationRequest;
use crate::state::AppState;

/// POST /annotations - draw a circle on an image
pub async fn post(
    State(state): State<AppState>,
    client: ClientKey,
    JsonBody(body): JsonBody<CreateAnnotationRequest>,
) -> ApiResult<Annotation> {
    let annotation = state.service.create_annotation(&client, body).await?;
    Ok(ApiResponse::created(annotation))
}
