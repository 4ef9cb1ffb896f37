//! Chat models for the conversational agent
//!
//! Database-backed conversation and message records, plus the tool-call
//! types shared between the executor loop and message storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Message role enum
///
/// Only `User` and `Assistant` messages are persisted; `System` and `Tool`
/// appear in the in-flight transcript sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Tool,
}

impl ChatRole {
    /// Returns the string representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
            ChatRole::Tool => "tool",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single tool call requested by the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call (used to match with the tool result)
    pub id: String,
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub call_type: String,
    /// The function to call
    pub function: ToolCallFunction,
}

/// Function details within a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Name of the function to call
    pub name: String,
    /// Arguments as returned by the model: either a JSON-encoded string or
    /// an already-structured object. Preserved raw; parsing is deferred to
    /// the executor so parse failures can fall back instead of aborting.
    pub arguments: serde_json::Value,
}

/// Lightweight conversation listing entry: no message bodies
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Message record from the messages table
///
/// Immutable once written; ordered within a conversation by creation time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    /// Unique message identifier
    pub id: Uuid,

    /// Conversation this message belongs to
    pub conversation_id: Uuid,

    /// User who owns this message
    pub user_id: Uuid,

    /// Message role (user or assistant)
    pub role: ChatRole,

    /// Message text content
    pub content: String,

    /// Optional structured payload (track lists, playlists, artist cards)
    /// validated against the response registry before storage
    pub data: Option<serde_json::Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Content of a message to append, before persistence assigns identity
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub role: ChatRole,
    pub content: String,
    pub data: Option<serde_json::Value>,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            data: None,
        }
    }

    pub fn assistant(content: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            data,
        }
    }
}

/// Input for inserting a message, fully scoped to conversation and user
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub data: Option<serde_json::Value>,
}

/// Inbound chat request fields read by this core
///
/// Request parsing and authentication happen upstream; this is the shape
/// the HTTP layer hands over.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}
