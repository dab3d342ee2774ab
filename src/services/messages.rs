use serde::{Deserialize, Serialize};

use super::{normalize_token, AnnotationService, COLLABORATION_POLICY};
use crate::auth::ClientKey;
use crate::database::models::ChatMessage;
use crate::error::ApiError;

/// Upper bound on a chat message, in characters after trimming
pub const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChatMessageRequest {
    pub message: String,
    #[serde(default)]
    pub share_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChatMessagesResponse {
    pub messages: Vec<ChatMessage>,
}

impl AnnotationService {
    /// POST /annotations/:annotationId/messages
    pub async fn add_chat_message(
        &self,
        client: &ClientKey,
        annotation_id: i64,
        req: AddChatMessageRequest,
    ) -> Result<ChatMessage, ApiError> {
        let message = validate_message(&req.message)?;

        self.authorizer
            .authorize_annotation(
                COLLABORATION_POLICY,
                annotation_id,
                normalize_token(req.share_token.as_deref()),
                client,
            )
            .await?;

        let created = self.store.insert_chat_message(annotation_id, message).await?;
        tracing::debug!(client = %client, annotation_id, message_id = created.id, "Added chat message");
        Ok(created)
    }

    /// GET /annotations/:annotationId/messages
    pub async fn list_chat_messages(
        &self,
        client: &ClientKey,
        annotation_id: i64,
        share_token: Option<&str>,
    ) -> Result<ListChatMessagesResponse, ApiError> {
        self.authorizer
            .authorize_annotation(COLLABORATION_POLICY, annotation_id, normalize_token(share_token), client)
            .await?;

        let messages = self.store.list_chat_messages(annotation_id).await?;
        Ok(ListChatMessagesResponse { messages })
    }
}

/// Trimmed message, 1..=1000 characters
fn validate_message(raw: &str) -> Result<&str, ApiError> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(ApiError::invalid_field("message", "Message cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::invalid_field(
            "message",
            format!("Message cannot exceed {} characters", MAX_MESSAGE_CHARS),
        ));
    }
    Ok(message)
}
