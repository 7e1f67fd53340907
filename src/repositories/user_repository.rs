use crate::models::user::User;
use crate::repositories::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    /// Insert a fresh unverified account holding its first OTP code.
    async fn create_pending(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
        otp_code: &str,
        otp_issued_at: DateTime<Utc>,
    ) -> RepositoryResult<User>;

    /// Overwrite an unverified account's credentials and OTP state. A repeat
    /// signup before verification replaces everything the first attempt set.
    async fn update_pending(
        &self,
        id: i64,
        password_hash: &str,
        full_name: &str,
        otp_code: &str,
        otp_issued_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// Replace the stored OTP code, invalidating any previous one.
    async fn set_otp(
        &self,
        id: i64,
        otp_code: &str,
        issued_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// Flip the account to verified and clear the OTP fields in one update.
    async fn mark_verified(&self, id: i64) -> RepositoryResult<()>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()>;
    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_pending(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
        otp_code: &str,
        otp_issued_at: DateTime<Utc>,
    ) -> RepositoryResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, full_name, email_verified, otp_code, otp_issued_at)
             VALUES (?, ?, ?, FALSE, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(otp_code)
        .bind(otp_issued_at)
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

    async fn update_pending(
        &self,
        id: i64,
        password_hash: &str,
        full_name: &str,
        otp_code: &str,
        otp_issued_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users
             SET password_hash = ?, full_name = ?, otp_code = ?, otp_issued_at = ?
             WHERE id = ? AND email_verified = FALSE",
        )
        .bind(password_hash)
        .bind(full_name)
        .bind(otp_code)
        .bind(otp_issued_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_otp(
        &self,
        id: i64,
        otp_code: &str,
        issued_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET otp_code = ?, otp_issued_at = ? WHERE id = ?")
            .bind(otp_code)
            .bind(issued_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn mark_verified(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email_verified = TRUE, otp_code = NULL, otp_issued_at = NULL
             WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, email_verified, otp_code, otp_issued_at, created_at
             FROM users
             WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, email_verified, otp_code, otp_issued_at, created_at
             FROM users
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        let limit = limit.unwrap_or(100);
        let offset = offset.unwrap_or(0);

        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, email_verified, otp_code, otp_issued_at, created_at
             FROM users
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers;

    #[tokio::test]
    async fn test_duplicate_email_already_exists() {
        let pool = test_helpers::create_test_db().await.unwrap();
        let repo = SqliteUserRepository::new(pool);

        let now = Utc::now();
        repo.create_pending("dup@example.com", "hash", "First User", "123456", now)
            .await
            .unwrap();

        let second = repo
            .create_pending("dup@example.com", "hash2", "Second User", "654321", now)
            .await;
        assert!(matches!(second, Err(RepositoryError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_mark_verified_clears_otp_state() {
        let pool = test_helpers::create_test_db().await.unwrap();
        let repo = SqliteUserRepository::new(pool);

        let user = repo
            .create_pending("otp@example.com", "hash", "Otp User", "123456", Utc::now())
            .await
            .unwrap();
        assert_eq!(user.otp_code.as_deref(), Some("123456"));
        assert!(user.otp_issued_at.is_some());
        assert!(!user.email_verified);

        repo.mark_verified(user.id).await.unwrap();

        let reloaded = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.email_verified);
        assert!(reloaded.otp_code.is_none());
        assert!(reloaded.otp_issued_at.is_none());
    }

    #[tokio::test]
    async fn test_update_pending_skips_verified_accounts() {
        let pool = test_helpers::create_test_db().await.unwrap();
        let repo = SqliteUserRepository::new(pool);

        let user = repo
            .create_pending("done@example.com", "hash", "Done User", "123456", Utc::now())
            .await
            .unwrap();
        repo.mark_verified(user.id).await.unwrap();

        let result = repo
            .update_pending(user.id, "new-hash", "New Name", "999999", Utc::now())
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
