use crate::models::conversation::{Conversation, ConversationRow};
use crate::repositories::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ConversationRepository: Send + Sync {
    /// Look up the conversation between two users regardless of which side
    /// created it.
    async fn find_between(&self, a: i64, b: i64) -> RepositoryResult<Option<Conversation>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Conversation>>;

    /// Create the conversation row for a pair. The unique pair index makes a
    /// concurrent create for the same two users surface as `AlreadyExists`.
    async fn create(&self, a: i64, b: i64, now: DateTime<Utc>) -> RepositoryResult<Conversation>;

    /// Bump the activity timestamp so the conversation sorts to the top.
    async fn touch(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<()>;

    /// Every conversation the user participates in, newest activity first,
    /// with the peer's name, the latest raw message and the unread tally.
    async fn list_for_user(&self, user_id: i64) -> RepositoryResult<Vec<ConversationRow>>;
}

pub struct SqliteConversationRepository {
    pool: SqlitePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for SqliteConversationRepository {
    async fn find_between(&self, a: i64, b: i64) -> RepositoryResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, user1_id, user2_id, updated_at
             FROM conversations
             WHERE (user1_id = ? AND user2_id = ?) OR (user1_id = ? AND user2_id = ?)",
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, user1_id, user2_id, updated_at FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn create(&self, a: i64, b: i64, now: DateTime<Utc>) -> RepositoryResult<Conversation> {
        let result = sqlx::query(
            "INSERT INTO conversations (user1_id, user2_id, updated_at) VALUES (?, ?, ?)",
        )
        .bind(a)
        .bind(b)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => {
                let id = res.last_insert_rowid();
                self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
            }
            Err(e) => {
                if e.to_string().contains("UNIQUE") {
                    Err(RepositoryError::AlreadyExists)
                } else {
                    Err(RepositoryError::Database(e))
                }
            }
        }
    }

    async fn touch(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_for_user(&self, user_id: i64) -> RepositoryResult<Vec<ConversationRow>> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            "SELECT c.id,
                    u.id AS other_user_id,
                    u.full_name AS other_full_name,
                    (SELECT m.content FROM messages m
                     WHERE m.conversation_id = c.id
                     ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message,
                    (SELECT m.created_at FROM messages m
                     WHERE m.conversation_id = c.id
                     ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message_time,
                    (SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id
                       AND m.sender_id != ?
                       AND m.is_read = FALSE) AS unread_count
             FROM conversations c
             JOIN users u ON (u.id = c.user1_id OR u.id = c.user2_id) AND u.id != ?
             WHERE c.user1_id = ? OR c.user2_id = ?
             ORDER BY c.updated_at DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers;

    async fn seed_user(pool: &SqlitePool, email: &str, name: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (email, password_hash, full_name, email_verified)
             VALUES (?, 'hash', ?, TRUE)",
        )
        .bind(email)
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_pair_unique_across_orderings() {
        let pool = test_helpers::create_test_db().await.unwrap();
        let repo = SqliteConversationRepository::new(pool.clone());

        let alice = seed_user(&pool, "alice@example.com", "Alice").await;
        let bob = seed_user(&pool, "bob@example.com", "Bob").await;

        repo.create(alice, bob, Utc::now()).await.unwrap();

        // Inserting the reversed pair must trip the same unique index.
        let reversed = repo.create(bob, alice, Utc::now()).await;
        assert!(matches!(reversed, Err(RepositoryError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_find_between_matches_either_ordering() {
        let pool = test_helpers::create_test_db().await.unwrap();
        let repo = SqliteConversationRepository::new(pool.clone());

        let alice = seed_user(&pool, "alice@example.com", "Alice").await;
        let bob = seed_user(&pool, "bob@example.com", "Bob").await;

        let created = repo.create(alice, bob, Utc::now()).await.unwrap();

        let forward = repo.find_between(alice, bob).await.unwrap().unwrap();
        let backward = repo.find_between(bob, alice).await.unwrap().unwrap();
        assert_eq!(forward.id, created.id);
        assert_eq!(backward.id, created.id);
    }
}
