//! Core services of the Crescendo agent
//!
//! This module contains the agent's moving parts:
//! - The tool-calling executor loop
//! - Conversation storage with auto-titling
//! - Per-user preference tracking
//! - Context building for model requests
//! - The structured response-type registry

pub mod context;
pub mod conversation;
pub mod executor;
pub mod preferences;
pub mod registry;

pub use context::ContextBuilder;
pub use conversation::ConversationStore;
pub use executor::ToolCallExecutor;
pub use preferences::PreferenceTracker;
pub use registry::ResponseRegistry;
