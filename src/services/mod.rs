pub mod auth_service;
pub mod chat_service;
pub mod email_service;
pub mod message_cipher;
pub mod password;
pub mod token_service;
pub mod user_service;
pub mod verification_service;

pub use auth_service::AuthService;
pub use chat_service::ChatService;
pub use email_service::{create_email_service, EmailService, MockEmailService, SmtpEmailService};
pub use message_cipher::MessageCipher;
pub use token_service::TokenService;
pub use user_service::UserService;
pub use verification_service::VerificationService;
