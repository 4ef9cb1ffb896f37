//! Error handling for the Crescendo agent core
//!
//! A unified error type using thiserror. Expected chat-flow failures
//! (unknown tools, tool exceptions, malformed arguments, iteration
//! exhaustion, swallowed persistence errors) never surface through this
//! type; it covers the genuinely exceptional paths and programmer errors.

use thiserror::Error;

/// Agent core error type
#[derive(Debug, Error)]
pub enum AgentError {
    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Generic keyed-store failure (non-sqlx persistence backends)
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON serialization failed
    #[error("json serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller supplied invalid input (programmer error)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A response type was registered twice
    #[error("response type already registered: {0}")]
    DuplicateResponseType(String),
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
