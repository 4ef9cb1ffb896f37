//! Crescendo conversational agent core
//!
//! This crate is the AI assistant engine behind the Crescendo music
//! discovery platform: the tool-calling loop that lets the model invoke
//! structured tools, the conversation store and preference tracker that
//! feed multi-turn context into each request, and the response-type
//! registry that keeps model output and UI rendering driven off the same
//! table. HTTP handlers, authentication, and the concrete music tools live
//! in the surrounding application and consume this crate as a library.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use models::chat::{
    ChatRequest, ChatRole, ConversationSummary, Message, NewMessage, ToolCall,
    ToolCallFunction,
};
pub use repositories::{ConversationPersistence, PgConversationRepository};
pub use services::context::{AgentContext, ContextBuilder, ContextFilters};
pub use services::conversation::ConversationStore;
pub use services::executor::{
    AgentTool, AssistantTurn, BoundModel, ChatModel, ExecutedToolCall, ToolCallExecutor,
    ToolDefinition, ToolLoopOutcome, TranscriptMessage,
};
pub use services::preferences::{PreferenceTracker, UserPreferences};
pub use services::registry::{
    default_registry, ResponseCategory, ResponseHandler, ResponseRegistry, ResponseValidator,
};
