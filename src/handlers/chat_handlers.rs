use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct SendMessageBody {
    pub receiver_id: Option<i64>,
    pub content: Option<String>,
}

/// POST /api/chat/send - Deliver a message, creating the conversation on first contact
pub async fn send_message_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<SendMessageBody>,
) -> Result<impl IntoResponse, AppError> {
    let receiver_id = body
        .receiver_id
        .ok_or_else(|| AppError::Validation("Receiver ID and content are required".to_string()))?;
    let content = body.content.unwrap_or_default();

    let sent = state
        .chat_service
        .send_message(auth_user.user_id, receiver_id, &content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Message sent",
            "conversation_id": sent.conversation_id,
            "message_id": sent.message_id,
            "content": content,
            "created_at": sent.created_at,
        })),
    ))
}

/// GET /api/chat/conversations - Inbox summaries, newest activity first
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let conversations = state
        .chat_service
        .list_conversations(auth_user.user_id)
        .await?;

    Ok(Json(json!({ "conversations": conversations })))
}

/// GET /api/chat/{conversation_id}/messages - Full thread, marking peer messages read
pub async fn list_messages_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(conversation_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let messages = state
        .chat_service
        .list_messages(conversation_id, auth_user.user_id)
        .await?;

    Ok(Json(json!({ "messages": messages })))
}
