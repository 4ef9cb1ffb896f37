//! Persistence layer for the agent core
//!
//! Conversation storage is modeled as a generic durable keyed store behind
//! the [`ConversationPersistence`] trait, so services and tests inject the
//! backend instead of reaching for a connection pool directly. The
//! production implementation is PostgreSQL via sqlx.

pub mod conversation;

pub use conversation::{ConversationPersistence, PgConversationRepository};
