//! Data models for the Crescendo agent core

pub mod chat;

pub use chat::{
    ChatRequest, ChatRole, ConversationSummary, CreateMessage, Message, NewMessage,
    ToolCall, ToolCallFunction,
};
