pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use config::settings::AppConfig;
use repositories::{
    conversation_repository::SqliteConversationRepository,
    message_repository::SqliteMessageRepository, user_repository::SqliteUserRepository,
};
use services::{
    message_cipher::CipherError, AuthService, ChatService, EmailService, MessageCipher,
    TokenService, UserService, VerificationService,
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub verification_service: Arc<VerificationService>,
    pub chat_service: Arc<ChatService>,
    pub token_service: Arc<TokenService>,
    pub pool: sqlx::SqlitePool,
}

impl AppState {
    /// Wires repositories and services onto the given pool.
    pub fn new(
        pool: sqlx::SqlitePool,
        config: &AppConfig,
        email_service: Box<dyn EmailService>,
    ) -> Result<Self, CipherError> {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let conversation_repository = Arc::new(SqliteConversationRepository::new(pool.clone()));
        let message_repository = Arc::new(SqliteMessageRepository::new(pool.clone()));

        let token_service = Arc::new(TokenService::new(
            config.jwt_secret.clone(),
            config.token_ttl_secs,
        ));
        let cipher = Arc::new(MessageCipher::new(config.encryption_key.clone())?);

        let user_service = Arc::new(UserService::new(user_repository.clone()));
        let auth_service = Arc::new(AuthService::new(
            user_repository.clone(),
            token_service.clone(),
        ));
        let verification_service = Arc::new(VerificationService::new(
            user_repository.clone(),
            email_service,
            token_service.clone(),
            config.otp_expiry_minutes,
        ));
        let chat_service = Arc::new(ChatService::new(
            conversation_repository,
            message_repository,
            user_repository,
            cipher,
        ));

        Ok(AppState {
            user_service,
            auth_service,
            verification_service,
            chat_service,
            token_service,
            pool,
        })
    }
}

/// Full API route table. Protected routes sit behind the bearer-token guard;
/// the verified identity reaches handlers through request extensions.
pub fn api_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/signup", post(handlers::signup_handler))
        .route("/api/auth/verify-otp", post(handlers::verify_otp_handler))
        .route("/api/auth/resend-otp", post(handlers::resend_otp_handler))
        .route("/api/auth/login", post(handlers::login_handler));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::me_handler))
        .route(
            "/api/chat/conversations",
            get(handlers::list_conversations_handler),
        )
        .route(
            "/api/chat/{conversation_id}/messages",
            get(handlers::list_messages_handler),
        )
        .route("/api/chat/send", post(handlers::send_message_handler))
        .route(
            "/api/notifications/check",
            get(handlers::check_notifications_handler),
        )
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
