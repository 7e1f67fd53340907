use crate::models::user::User;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::RepositoryError;
use crate::services::password::{hash_password, HashError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Password must be at least 8 characters long")]
    WeakPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("User not found")]
    UserNotFound,
    #[error("Password hashing failed: {0}")]
    HashingError(#[from] HashError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct UpdatePasswordRequest {
    pub user_id: i64,
    pub new_password: String,
    pub new_password_confirm: Option<String>,
}

/// Account administration used by the CLI. Signup and login live in the
/// verification and auth services.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(email).await?)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn update_password(
        &self,
        request: UpdatePasswordRequest,
    ) -> Result<(), UserServiceError> {
        // Validate password confirmation if provided
        if let Some(ref confirm) = request.new_password_confirm {
            if request.new_password != *confirm {
                return Err(UserServiceError::PasswordMismatch);
            }
        }

        if request.new_password.len() < 8 {
            return Err(UserServiceError::WeakPassword);
        }

        let password_hash = hash_password(&request.new_password)?;

        match self
            .repository
            .update_password(request.user_id, &password_hash)
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::Repository(e)),
        }
    }

    /// Force-verify an account, bypassing the OTP flow. Admin use only.
    pub async fn verify_user_email(&self, email: &str) -> Result<(), UserServiceError> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        match self.repository.mark_verified(user.id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::Repository(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use mockall::predicate::*;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Test User".to_string(),
            email_verified: true,
            otp_code: None,
            otp_issued_at: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_update_password_success() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_update_password()
            .withf(|id, hash| *id == 1 && hash.starts_with("$argon2"))
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(()) }));

        let service = UserService::new(Arc::new(mock_repo));

        let request = UpdatePasswordRequest {
            user_id: 1,
            new_password: "password123".to_string(),
            new_password_confirm: Some("password123".to_string()),
        };

        let result = service.update_password(request).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_password_weak() {
        let mock_repo = MockUserRepository::new();
        let service = UserService::new(Arc::new(mock_repo));

        let request = UpdatePasswordRequest {
            user_id: 1,
            new_password: "short".to_string(),
            new_password_confirm: None,
        };

        let result = service.update_password(request).await;
        assert!(matches!(result, Err(UserServiceError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_update_password_mismatch() {
        let mock_repo = MockUserRepository::new();
        let service = UserService::new(Arc::new(mock_repo));

        let request = UpdatePasswordRequest {
            user_id: 1,
            new_password: "password123".to_string(),
            new_password_confirm: Some("password124".to_string()),
        };

        let result = service.update_password(request).await;
        assert!(matches!(result, Err(UserServiceError::PasswordMismatch)));
    }

    #[tokio::test]
    async fn test_update_password_unknown_user() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_update_password()
            .withf(|id, _| *id == 42)
            .returning(|_, _| Box::pin(async move { Err(RepositoryError::NotFound) }));

        let service = UserService::new(Arc::new(mock_repo));

        let request = UpdatePasswordRequest {
            user_id: 42,
            new_password: "password123".to_string(),
            new_password_confirm: None,
        };

        let result = service.update_password(request).await;
        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_verify_user_email_success() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(Some(sample_user())) }));
        mock_repo
            .expect_mark_verified()
            .with(eq(1))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(()) }));

        let service = UserService::new(Arc::new(mock_repo));

        let result = service.verify_user_email("test@example.com").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_verify_user_email_unknown() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = UserService::new(Arc::new(mock_repo));

        let result = service.verify_user_email("nobody@example.com").await;
        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }
}
