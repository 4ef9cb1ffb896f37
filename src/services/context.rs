//! Context assembly for model requests
//!
//! Folds recent conversation history and preference signals into the
//! compact context object the routing layer feeds into the model's input
//! messages. Anonymous users get an empty context; degraded backends
//! degrade the context rather than the request.

use std::sync::Arc;

use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::services::conversation::ConversationStore;
use crate::services::preferences::PreferenceTracker;

/// Soft filter hints derived from preference signals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Compact per-request context for the routing layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentContext {
    /// Preference-derived filters, e.g. the user's top genre
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<ContextFilters>,
    /// Tail of the recent conversation as `role: content` lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AgentContext {
    pub fn is_empty(&self) -> bool {
        self.filters.is_none() && self.summary.is_none()
    }
}

/// Builds [`AgentContext`] from the store and the preference tracker
pub struct ContextBuilder {
    store: ConversationStore,
    preferences: Arc<PreferenceTracker>,
    context_message_limit: i64,
    summary_max_chars: usize,
}

impl ContextBuilder {
    pub fn new(
        store: ConversationStore,
        preferences: Arc<PreferenceTracker>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            store,
            preferences,
            context_message_limit: config.context_message_limit,
            summary_max_chars: config.summary_max_chars,
        }
    }

    /// Build the context for a request
    ///
    /// No user id means no personalization: the context comes back empty.
    /// The history summary keeps the tail of the joined lines, because
    /// recency matters more than how a long conversation started.
    #[instrument(skip(self))]
    pub async fn build_context(
        &self,
        user_id: Option<Uuid>,
        conversation_id: Option<Uuid>,
    ) -> AgentContext {
        let Some(user_id) = user_id else {
            return AgentContext::default();
        };

        let summary = match conversation_id {
            Some(conversation_id) => {
                let messages = self
                    .store
                    .get_conversation(user_id, conversation_id, self.context_message_limit)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(error = %e, %conversation_id, "Failed to load history for context");
                        Vec::new()
                    });

                if messages.is_empty() {
                    None
                } else {
                    let joined = messages
                        .iter()
                        .map(|m| format!("{}: {}", m.role, m.content))
                        .collect::<Vec<_>>()
                        .join("\n");
                    Some(tail(&joined, self.summary_max_chars))
                }
            }
            None => None,
        };

        let filters = self
            .preferences
            .top_genre(user_id)
            .map(|genre| ContextFilters { genre: Some(genre) });

        AgentContext { filters, summary }
    }
}

/// Last `max` characters of a string, char-boundary safe
fn tail(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        s.to_string()
    } else {
        s.chars().skip(count - max).collect()
    }
}
