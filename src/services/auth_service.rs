use crate::models::user::User;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::RepositoryError;
use crate::services::password::verify_password;
use crate::services::token_service::{TokenError, TokenService};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email not verified")]
    EmailNotVerified,
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    token_service: Arc<TokenService>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, token_service: Arc<TokenService>) -> Self {
        Self {
            user_repository,
            token_service,
        }
    }

    /// Check credentials and issue a session token.
    ///
    /// A missing account and a wrong password both come back as
    /// `InvalidCredentials`, so responses never reveal whether an email is
    /// registered. The verification check runs after the password check for
    /// the same reason.
    pub async fn login(&self, request: LoginRequest) -> Result<(String, User), AuthServiceError> {
        let email = request.email.trim();

        let user = self
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        if !user.email_verified {
            return Err(AuthServiceError::EmailNotVerified);
        }

        let token = self.token_service.issue(user.id, &user.email)?;

        tracing::info!("User {} logged in", user.id);
        Ok((token, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::services::password::hash_password;
    use mockall::predicate::*;

    fn verified_user(password: &str) -> User {
        User {
            id: 7,
            email: "user@example.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            full_name: "Sample User".to_string(),
            email_verified: true,
            otp_code: None,
            otp_issued_at: None,
            created_at: None,
        }
    }

    fn service_with(mock_repo: MockUserRepository) -> AuthService {
        AuthService::new(
            Arc::new(mock_repo),
            Arc::new(TokenService::new("test-jwt-secret", 3600)),
        )
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("nobody@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = service_with(mock_repo);

        let result = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo.expect_find_by_email().returning(|_| {
            Box::pin(async move { Ok(Some(verified_user("right-password"))) })
        });

        let service = service_with(mock_repo);

        let result = service
            .login(LoginRequest {
                email: "user@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unverified_email() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo.expect_find_by_email().returning(|_| {
            Box::pin(async move {
                let mut user = verified_user("password123");
                user.email_verified = false;
                Ok(Some(user))
            })
        });

        let service = service_with(mock_repo);

        // The password is correct, verification is the only thing missing.
        let result = service
            .login(LoginRequest {
                email: "user@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthServiceError::EmailNotVerified)));
    }

    #[tokio::test]
    async fn test_login_success_issues_valid_token() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("user@example.com"))
            .returning(|_| Box::pin(async move { Ok(Some(verified_user("password123"))) }));

        let token_service = Arc::new(TokenService::new("test-jwt-secret", 3600));
        let service = AuthService::new(Arc::new(mock_repo), token_service.clone());

        let (token, user) = service
            .login(LoginRequest {
                email: "user@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .expect("Expected Ok result");

        assert_eq!(user.id, 7);
        let claims = token_service.verify(&token).expect("token should verify");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "user@example.com");
    }

    #[tokio::test]
    async fn test_login_trims_email_whitespace() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("user@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(Some(verified_user("password123"))) }));

        let service = service_with(mock_repo);

        let result = service
            .login(LoginRequest {
                email: "  user@example.com  ".to_string(),
                password: "password123".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }
}
