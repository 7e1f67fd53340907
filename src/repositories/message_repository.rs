use crate::models::message::{Message, UnreadPreview};
use crate::repositories::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MessageRepository: Send + Sync {
    /// Store a message and return its id. `content` is ciphertext by the time
    /// it reaches the repository.
    async fn insert(
        &self,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<i64>;

    /// Full history of a conversation, oldest first.
    async fn list_for_conversation(&self, conversation_id: i64) -> RepositoryResult<Vec<Message>>;

    /// Mark every message the peer sent in this conversation as read.
    /// Returns how many rows the update touched.
    async fn mark_read(&self, conversation_id: i64, reader_id: i64) -> RepositoryResult<u64>;

    /// Unread messages addressed to the user across all conversations.
    async fn count_unread_for_user(&self, user_id: i64) -> RepositoryResult<i64>;

    /// The newest unread message addressed to the user, with the sender's
    /// name for the notification preview.
    async fn latest_unread_for_user(&self, user_id: i64)
        -> RepositoryResult<Option<UnreadPreview>>;
}

pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn insert(
        &self,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, sender_id, content, created_at, is_read)
             VALUES (?, ?, ?, ?, FALSE)",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_for_conversation(&self, conversation_id: i64) -> RepositoryResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, conversation_id, sender_id, content, created_at, is_read
             FROM messages
             WHERE conversation_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn mark_read(&self, conversation_id: i64, reader_id: i64) -> RepositoryResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE
             WHERE conversation_id = ? AND sender_id != ? AND is_read = FALSE",
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_unread_for_user(&self, user_id: i64) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM messages m
             JOIN conversations c ON c.id = m.conversation_id
             WHERE (c.user1_id = ? OR c.user2_id = ?)
               AND m.sender_id != ?
               AND m.is_read = FALSE",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn latest_unread_for_user(
        &self,
        user_id: i64,
    ) -> RepositoryResult<Option<UnreadPreview>> {
        let preview = sqlx::query_as::<_, UnreadPreview>(
            "SELECT m.content, u.full_name AS sender_name
             FROM messages m
             JOIN conversations c ON c.id = m.conversation_id
             JOIN users u ON u.id = m.sender_id
             WHERE (c.user1_id = ? OR c.user2_id = ?)
               AND m.sender_id != ?
               AND m.is_read = FALSE
             ORDER BY m.created_at DESC, m.id DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preview)
    }
}
