//! Conversation storage with lazy creation and auto-titling
//!
//! A resilient wrapper over [`ConversationPersistence`]: writes are
//! best-effort, because a chat response must never fail merely because
//! logging the exchange did.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::AgentResult;
use crate::models::chat::{
    ChatRole, ConversationSummary, CreateMessage, Message, NewMessage,
};
use crate::repositories::ConversationPersistence;

/// Title used when the first message yields no usable text
const UNTITLED_CONVERSATION: &str = "New conversation";

/// Service for persisting and retrieving conversations
#[derive(Clone)]
pub struct ConversationStore {
    repository: Arc<dyn ConversationPersistence>,
    title_max_chars: usize,
    conversation_list_limit: i64,
}

impl ConversationStore {
    pub fn new(repository: Arc<dyn ConversationPersistence>, config: &AgentConfig) -> Self {
        Self {
            repository,
            title_max_chars: config.title_max_chars,
            conversation_list_limit: config.conversation_list_limit,
        }
    }

    /// Append a message, creating the conversation on first use
    ///
    /// The conversation is titled exactly once: an explicit `title` wins;
    /// otherwise the first user message is truncated into one. Persistence
    /// failures are logged and swallowed; the caller gets `None` and the
    /// chat flow continues.
    #[instrument(skip(self, message, title), fields(role = %message.role))]
    pub async fn store_message(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message: NewMessage,
        title: Option<String>,
    ) -> Option<Message> {
        if let Err(e) = self
            .repository
            .upsert_conversation(conversation_id, user_id)
            .await
        {
            warn!(error = %e, %conversation_id, "Failed to ensure conversation exists");
            return None;
        }

        match self.repository.count_messages(conversation_id, user_id).await {
            Ok(0) => {
                let derived = title.or_else(|| {
                    (message.role == ChatRole::User)
                        .then(|| self.derive_title(&message.content))
                });
                if let Some(derived) = derived {
                    if let Err(e) = self
                        .repository
                        .set_conversation_title(conversation_id, user_id, &derived)
                        .await
                    {
                        warn!(error = %e, %conversation_id, "Failed to set conversation title");
                    }
                }
            }
            Ok(_) => {
                if let Some(explicit) = title {
                    debug!(%conversation_id, title = %explicit, "Ignoring title for existing conversation");
                }
            }
            Err(e) => {
                warn!(error = %e, %conversation_id, "Failed to count messages for titling");
            }
        }

        let input = CreateMessage {
            conversation_id,
            user_id,
            role: message.role,
            content: message.content,
            data: message.data,
        };

        match self.repository.insert_message(input).await {
            Ok(stored) => {
                debug!(%conversation_id, message_id = %stored.id, "Message stored");
                Some(stored)
            }
            Err(e) => {
                warn!(error = %e, %conversation_id, "Failed to store message");
                None
            }
        }
    }

    /// The most recent `limit` messages of a conversation, oldest first
    #[instrument(skip(self))]
    pub async fn get_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        limit: i64,
    ) -> AgentResult<Vec<Message>> {
        self.repository
            .find_recent_messages(conversation_id, user_id, limit)
            .await
    }

    /// Up to 20 conversations for a user, most recently updated first
    ///
    /// Returns id/title/updated_at only; message bodies come from
    /// [`get_conversation`](Self::get_conversation).
    #[instrument(skip(self))]
    pub async fn get_user_conversations(
        &self,
        user_id: Uuid,
    ) -> AgentResult<Vec<ConversationSummary>> {
        self.repository
            .find_conversations(user_id, self.conversation_list_limit)
            .await
    }

    /// Truncate the first user message into a title
    fn derive_title(&self, content: &str) -> String {
        let title: String = content.trim().chars().take(self.title_max_chars).collect();
        let title = title.trim_end();
        if title.is_empty() {
            UNTITLED_CONVERSATION.to_string()
        } else {
            title.to_string()
        }
    }
}
