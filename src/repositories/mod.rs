pub mod conversation_repository;
pub mod message_repository;
pub mod user_repository;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub use conversation_repository::{ConversationRepository, SqliteConversationRepository};
pub use message_repository::{MessageRepository, SqliteMessageRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
