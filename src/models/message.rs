use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Stored message row. `content` is ciphertext as persisted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// A message as handed to the requesting participant: decrypted and tagged
/// with whether the requester wrote it. `is_read` on the requester's own
/// messages reports whether the peer has seen them.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub is_mine: bool,
}

/// Receipt for a delivered message.
#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub message_id: i64,
    pub conversation_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Newest unread message for the polling endpoint, still encrypted.
#[derive(Debug, Clone, FromRow)]
pub struct UnreadPreview {
    pub content: String,
    pub sender_name: String,
}

/// Decrypted form of [`UnreadPreview`] for the notification payload.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadNotice {
    pub from: String,
    pub preview: String,
}
