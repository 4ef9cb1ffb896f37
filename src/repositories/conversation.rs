//! Conversation persistence: trait contract and PostgreSQL implementation
//!
//! All queries are scoped by user_id as well as conversation_id so a user
//! can never read or append to another user's conversation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AgentResult;
use crate::models::chat::{ConversationSummary, CreateMessage, Message};

/// Durable keyed-store contract for conversations and messages
///
/// Five write/read operations plus the recency-ordered listing. Any store
/// satisfying these can back the [`ConversationStore`] service; the trait
/// exists so integration tests can run against an in-memory implementation.
///
/// [`ConversationStore`]: crate::services::conversation::ConversationStore
#[async_trait]
pub trait ConversationPersistence: Send + Sync {
    /// Create the conversation row if it does not exist; no-op otherwise
    async fn upsert_conversation(&self, conversation_id: Uuid, user_id: Uuid) -> AgentResult<()>;

    /// Append-only message insert; bumps the conversation's updated_at
    async fn insert_message(&self, input: CreateMessage) -> AgentResult<Message>;

    /// Count messages in a conversation
    async fn count_messages(&self, conversation_id: Uuid, user_id: Uuid) -> AgentResult<i64>;

    /// The most recent `limit` messages, returned in chronological order
    async fn find_recent_messages(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        limit: i64,
    ) -> AgentResult<Vec<Message>>;

    /// Set the conversation title
    async fn set_conversation_title(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        title: &str,
    ) -> AgentResult<()>;

    /// Conversations for a user ordered by most-recently-updated,
    /// titles and timestamps only
    async fn find_conversations(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AgentResult<Vec<ConversationSummary>>;
}

/// PostgreSQL-backed conversation persistence
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Create a new repository over a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationPersistence for PgConversationRepository {
    #[instrument(skip(self))]
    async fn upsert_conversation(&self, conversation_id: Uuid, user_id: Uuid) -> AgentResult<()> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, input), fields(conversation_id = %input.conversation_id, role = %input.role))]
    async fn insert_message(&self, input: CreateMessage) -> AgentResult<Message> {
        let mut tx = self.pool.begin().await?;

        // Bump updated_at and verify ownership in one statement; zero rows
        // means the conversation is missing or owned by someone else.
        let touched = sqlx::query(
            r#"
            UPDATE conversations
            SET updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(input.conversation_id)
        .bind(input.user_id)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, user_id, role, content, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, user_id, role, content, data, created_at
            "#,
        )
        .bind(input.conversation_id)
        .bind(input.user_id)
        .bind(input.role.as_str())
        .bind(input.content)
        .bind(input.data)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(message)
    }

    #[instrument(skip(self))]
    async fn count_messages(&self, conversation_id: Uuid, user_id: Uuid) -> AgentResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn find_recent_messages(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        limit: i64,
    ) -> AgentResult<Vec<Message>> {
        // Subquery selects the recent tail in desc order, outer query
        // restores chronological order for the caller.
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM (
                SELECT id, conversation_id, user_id, role, content, data, created_at
                FROM messages
                WHERE conversation_id = $1 AND user_id = $2
                ORDER BY created_at DESC, id DESC
                LIMIT $3
            ) AS recent
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    #[instrument(skip(self))]
    async fn set_conversation_title(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        title: &str,
    ) -> AgentResult<()> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET title = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_conversations(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AgentResult<Vec<ConversationSummary>> {
        let conversations = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT id, title, updated_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }
}
