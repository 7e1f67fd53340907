use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A thread between two users. The pair is stored in the order the first
/// sender supplied it; ordering-independent identity is enforced by the
/// unique pair index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn involves(&self, user_id: i64) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    pub fn other_participant(&self, user_id: i64) -> i64 {
        if self.user1_id == user_id {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

/// Raw listing row straight from the store: the last message is still
/// ciphertext at this point.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub id: i64,
    pub other_user_id: i64,
    pub other_full_name: String,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

/// What the inbox view shows per conversation, newest activity first.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub other_user: PeerProfile,
    pub last_message: String,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeerProfile {
    pub id: i64,
    pub full_name: String,
}
