pub mod auth_handlers;
pub mod chat_handlers;
pub mod notification_handlers;

pub use auth_handlers::*;
pub use chat_handlers::*;
pub use notification_handlers::*;
