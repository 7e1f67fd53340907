use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;

/// GET /api/notifications/check - Unread total plus a preview of the newest unread message
pub async fn check_notifications_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let unread = state.chat_service.unread_count(auth_user.user_id).await?;

    let latest = if unread > 0 {
        state.chat_service.latest_unread(auth_user.user_id).await?
    } else {
        None
    };

    Ok(Json(json!({
        "unread_messages": unread,
        "latest_message": latest,
    })))
}
