use crate::models::user::User;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::RepositoryError;
use crate::services::email_service::{EmailError, EmailService};
use crate::services::password::{hash_password, HashError};
use crate::services::token_service::{TokenError, TokenService};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Email, password, and full name are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Password must be at least 8 characters long")]
    WeakPassword,
    #[error("Email already registered")]
    AlreadyRegistered,
    #[error("Email is already verified")]
    AlreadyVerified,
    #[error("No account found for this email")]
    NotFound,
    #[error("No verification code has been issued")]
    NoCodeIssued,
    #[error("Verification code has expired")]
    Expired,
    #[error("Invalid verification code")]
    Mismatch,
    #[error("Failed to send verification email: {0}")]
    Delivery(#[from] EmailError),
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] HashError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Runs the signup and email verification flow: pending accounts, one-time
/// codes, and the token issued once a code checks out.
pub struct VerificationService {
    repository: Arc<dyn UserRepository>,
    email_service: Box<dyn EmailService>,
    token_service: Arc<TokenService>,
    otp_expiry_minutes: i64,
}

impl VerificationService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        email_service: Box<dyn EmailService>,
        token_service: Arc<TokenService>,
        otp_expiry_minutes: i64,
    ) -> Self {
        Self {
            repository,
            email_service,
            token_service,
            otp_expiry_minutes,
        }
    }

    /// Register an account in the unverified state and email it a code.
    ///
    /// Signing up again with the same email before verifying replaces the
    /// earlier attempt wholesale, credentials included. A verified account
    /// can never be re-registered.
    pub async fn request_signup(&self, request: SignupRequest) -> Result<User, VerificationError> {
        let email = request.email.trim();
        let full_name = request.full_name.trim();

        if email.is_empty() || request.password.is_empty() || full_name.is_empty() {
            return Err(VerificationError::MissingFields);
        }
        if !EMAIL_REGEX.is_match(email) {
            return Err(VerificationError::InvalidEmail);
        }
        if request.password.len() < 8 {
            return Err(VerificationError::WeakPassword);
        }

        let password_hash = hash_password(&request.password)?;
        let code = generate_otp();
        let now = Utc::now();

        let user = match self.repository.find_by_email(email).await? {
            Some(existing) if existing.email_verified => {
                return Err(VerificationError::AlreadyRegistered);
            }
            Some(pending) => {
                self.repository
                    .update_pending(pending.id, &password_hash, full_name, &code, now)
                    .await?;
                User {
                    password_hash,
                    full_name: full_name.to_string(),
                    otp_code: Some(code.clone()),
                    otp_issued_at: Some(now),
                    ..pending
                }
            }
            None => {
                match self
                    .repository
                    .create_pending(email, &password_hash, full_name, &code, now)
                    .await
                {
                    Ok(user) => user,
                    // Lost a race with a concurrent signup for the same email.
                    Err(RepositoryError::AlreadyExists) => {
                        return Err(VerificationError::AlreadyRegistered)
                    }
                    Err(e) => return Err(VerificationError::Repository(e)),
                }
            }
        };

        self.email_service
            .send_otp_email(&user.email, &user.full_name, &code, self.otp_expiry_minutes)
            .await?;

        tracing::info!("Signup pending verification for user {}", user.id);
        Ok(user)
    }

    /// Check a submitted code and, on success, verify the account and issue
    /// its first session token.
    pub async fn verify_otp(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(String, User), VerificationError> {
        let user = self
            .repository
            .find_by_email(email.trim())
            .await?
            .ok_or(VerificationError::NotFound)?;

        if user.email_verified {
            return Err(VerificationError::AlreadyVerified);
        }

        let (stored_code, issued_at) = match (&user.otp_code, user.otp_issued_at) {
            (Some(code), Some(issued_at)) => (code, issued_at),
            _ => return Err(VerificationError::NoCodeIssued),
        };

        let age = Utc::now().signed_duration_since(issued_at);
        if age > Duration::minutes(self.otp_expiry_minutes) {
            return Err(VerificationError::Expired);
        }

        // Exact string match; a code with stray whitespace does not verify.
        if stored_code != code {
            return Err(VerificationError::Mismatch);
        }

        self.repository.mark_verified(user.id).await?;

        let token = self.token_service.issue(user.id, &user.email)?;

        tracing::info!("User {} verified their email", user.id);
        Ok((
            token,
            User {
                email_verified: true,
                otp_code: None,
                otp_issued_at: None,
                ..user
            },
        ))
    }

    /// Replace the pending code with a fresh one and email it again. The old
    /// code stops working immediately.
    pub async fn resend_otp(&self, email: &str) -> Result<(), VerificationError> {
        let user = self
            .repository
            .find_by_email(email.trim())
            .await?
            .ok_or(VerificationError::NotFound)?;

        if user.email_verified {
            return Err(VerificationError::AlreadyVerified);
        }

        let code = generate_otp();
        self.repository.set_otp(user.id, &code, Utc::now()).await?;

        self.email_service
            .send_otp_email(&user.email, &user.full_name, &code, self.otp_expiry_minutes)
            .await?;

        tracing::info!("Re-sent verification code to user {}", user.id);
        Ok(())
    }
}

/// Six decimal digits, never starting with zero.
fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
