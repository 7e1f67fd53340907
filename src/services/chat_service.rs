use crate::models::conversation::{Conversation, ConversationSummary, PeerProfile};
use crate::models::message::{MessageView, SentMessage, UnreadNotice};
use crate::repositories::conversation_repository::ConversationRepository;
use crate::repositories::message_repository::MessageRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::RepositoryError;
use crate::services::message_cipher::{CipherError, MessageCipher};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ChatServiceError {
    #[error("Receiver ID and content are required")]
    EmptyMessage,
    #[error("Cannot send a message to yourself")]
    SelfMessage,
    #[error("Recipient not found")]
    RecipientNotFound,
    #[error("Conversation not found")]
    ConversationNotFound,
    #[error("Not a participant in this conversation")]
    AccessDenied,
    #[error("Encryption error: {0}")]
    Encryption(#[from] CipherError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Direct messaging between two users: one conversation per pair, encrypted
/// bodies at rest, read-state cleared when a thread is opened.
pub struct ChatService {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    cipher: Arc<MessageCipher>,
}

impl ChatService {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        cipher: Arc<MessageCipher>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
            cipher,
        }
    }

    /// Store a message for the recipient, creating the pair's conversation on
    /// first contact. The body is encrypted before it touches the database.
    pub async fn send_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> Result<SentMessage, ChatServiceError> {
        if content.is_empty() {
            return Err(ChatServiceError::EmptyMessage);
        }
        if sender_id == receiver_id {
            return Err(ChatServiceError::SelfMessage);
        }

        // The recipient has to exist before a conversation row is created
        // for the pair.
        if self.users.find_by_id(receiver_id).await?.is_none() {
            return Err(ChatServiceError::RecipientNotFound);
        }

        let conversation = self
            .find_or_create_conversation(sender_id, receiver_id)
            .await?;

        let now = Utc::now();
        let ciphertext = self.cipher.encrypt(content)?;
        let message_id = self
            .messages
            .insert(conversation.id, sender_id, &ciphertext, now)
            .await?;
        self.conversations.touch(conversation.id, now).await?;

        tracing::debug!(
            "Message {} stored in conversation {}",
            message_id,
            conversation.id
        );
        Ok(SentMessage {
            message_id,
            conversation_id: conversation.id,
            created_at: now,
        })
    }

    /// Resolve the conversation for a pair, creating it on first contact.
    /// Two concurrent first messages race on the unique pair index; the loser
    /// re-reads the winner's row.
    pub async fn find_or_create_conversation(
        &self,
        a: i64,
        b: i64,
    ) -> Result<Conversation, ChatServiceError> {
        if let Some(existing) = self.conversations.find_between(a, b).await? {
            return Ok(existing);
        }

        match self.conversations.create(a, b, Utc::now()).await {
            Ok(created) => Ok(created),
            Err(RepositoryError::AlreadyExists) => self
                .conversations
                .find_between(a, b)
                .await?
                .ok_or(ChatServiceError::ConversationNotFound),
            Err(e) => Err(ChatServiceError::Repository(e)),
        }
    }

    /// All of a user's conversations, newest activity first, with decrypted
    /// previews and unread tallies.
    pub async fn list_conversations(
        &self,
        user_id: i64,
    ) -> Result<Vec<ConversationSummary>, ChatServiceError> {
        let rows = self.conversations.list_for_user(user_id).await?;

        let summaries = rows
            .into_iter()
            .map(|row| {
                let last_message = row
                    .last_message
                    .as_deref()
                    .map(|ciphertext| self.cipher.decrypt(ciphertext))
                    .unwrap_or_default();

                ConversationSummary {
                    id: row.id,
                    other_user: PeerProfile {
                        id: row.other_user_id,
                        full_name: row.other_full_name,
                    },
                    last_message,
                    last_message_time: row.last_message_time,
                    unread_count: row.unread_count,
                }
            })
            .collect();

        Ok(summaries)
    }

    /// Full decrypted history of one conversation for a participant.
    ///
    /// Opening a thread is what clears its unread state: everything the peer
    /// sent is marked read before the rows are fetched, so the response
    /// already reflects it.
    pub async fn list_messages(
        &self,
        conversation_id: i64,
        requester_id: i64,
    ) -> Result<Vec<MessageView>, ChatServiceError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ChatServiceError::ConversationNotFound)?;

        if !conversation.involves(requester_id) {
            return Err(ChatServiceError::AccessDenied);
        }

        let marked = self
            .messages
            .mark_read(conversation_id, requester_id)
            .await?;
        if marked > 0 {
            tracing::debug!(
                "Marked {} messages read in conversation {}",
                marked,
                conversation_id
            );
        }

        let messages = self.messages.list_for_conversation(conversation_id).await?;

        let views = messages
            .into_iter()
            .map(|message| MessageView {
                id: message.id,
                sender_id: message.sender_id,
                content: self.cipher.decrypt(&message.content),
                created_at: message.created_at,
                is_read: message.is_read,
                is_mine: message.sender_id == requester_id,
            })
            .collect();

        Ok(views)
    }

    /// Unread messages addressed to the user across all conversations.
    pub async fn unread_count(&self, user_id: i64) -> Result<i64, ChatServiceError> {
        Ok(self.messages.count_unread_for_user(user_id).await?)
    }

    /// Decrypted preview of the newest unread message, for notification
    /// polling.
    pub async fn latest_unread(
        &self,
        user_id: i64,
    ) -> Result<Option<UnreadNotice>, ChatServiceError> {
        let preview = self.messages.latest_unread_for_user(user_id).await?;

        Ok(preview.map(|p| UnreadNotice {
            from: p.sender_name,
            preview: self.cipher.decrypt(&p.content),
        }))
    }
}
