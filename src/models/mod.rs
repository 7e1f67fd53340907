pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::{Conversation, ConversationRow, ConversationSummary, PeerProfile};
pub use message::{Message, MessageView, SentMessage, UnreadNotice, UnreadPreview};
pub use user::{PublicUser, User};
