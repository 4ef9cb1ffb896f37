//! Mock model, tools, and persistence for integration tests
//!
//! The scripted model replays a fixed sequence of assistant turns so loop
//! behavior is fully deterministic; the in-memory repository implements
//! the persistence contract without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crescendo_agent::error::{AgentError, AgentResult};
use crescendo_agent::models::chat::{ConversationSummary, CreateMessage, Message};
use crescendo_agent::repositories::ConversationPersistence;
use crescendo_agent::services::executor::{
    AgentTool, AssistantTurn, BoundModel, ChatModel, ToolDefinition, TranscriptMessage,
};

// =============================================================================
// Scripted Model
// =============================================================================

/// Model that replays a fixed script of turns (or failures)
///
/// When the script runs dry it keeps repeating the last scripted turn, so
/// "always requests a tool call" scenarios only need one script entry.
pub struct ScriptedModel {
    inner: Arc<ScriptedInner>,
}

struct ScriptedInner {
    script: Mutex<Vec<Result<AssistantTurn, String>>>,
    cursor: AtomicUsize,
    invocations: AtomicUsize,
    bound_tools: Mutex<Vec<ToolDefinition>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<AssistantTurn, String>>) -> Self {
        assert!(!script.is_empty(), "script must have at least one entry");
        Self {
            inner: Arc::new(ScriptedInner {
                script: Mutex::new(script),
                cursor: AtomicUsize::new(0),
                invocations: AtomicUsize::new(0),
                bound_tools: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Model whose every reply requests the given tool calls
    pub fn always_calling(turn: AssistantTurn) -> Self {
        Self::new(vec![Ok(turn)])
    }

    /// Model that answers immediately with plain text
    pub fn final_answer(content: &str) -> Self {
        Self::new(vec![Ok(AssistantTurn {
            content: content.to_string(),
            tool_calls: vec![],
        })])
    }

    pub fn invocations(&self) -> usize {
        self.inner.invocations.load(Ordering::SeqCst)
    }

    pub fn bound_tool_names(&self) -> Vec<String> {
        self.inner
            .bound_tools
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }
}

impl ChatModel for ScriptedModel {
    fn bind_tools(&self, tools: Vec<ToolDefinition>) -> Arc<dyn BoundModel> {
        *self.inner.bound_tools.lock().unwrap() = tools;
        Arc::new(ScriptedBound {
            inner: Arc::clone(&self.inner),
        })
    }
}

struct ScriptedBound {
    inner: Arc<ScriptedInner>,
}

#[async_trait]
impl BoundModel for ScriptedBound {
    async fn invoke(&self, _messages: &[TranscriptMessage]) -> anyhow::Result<AssistantTurn> {
        self.inner.invocations.fetch_add(1, Ordering::SeqCst);
        let script = self.inner.script.lock().unwrap();
        let index = self
            .inner
            .cursor
            .fetch_add(1, Ordering::SeqCst)
            .min(script.len() - 1);
        match &script[index] {
            Ok(turn) => Ok(turn.clone()),
            Err(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

// =============================================================================
// Test Tools
// =============================================================================

/// Tool that wraps its arguments into a result object
pub struct EchoTool;

#[async_trait]
impl AgentTool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "Echoes its arguments back".to_string(),
            parameters: json!({"type": "object"}),
        }
    }

    async fn invoke(&self, arguments: Value) -> anyhow::Result<Value> {
        Ok(json!({ "echoed": arguments }))
    }
}

/// Tool that always fails
pub struct FailingTool;

#[async_trait]
impl AgentTool for FailingTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "broken".to_string(),
            description: "Always fails".to_string(),
            parameters: json!({"type": "object"}),
        }
    }

    async fn invoke(&self, _arguments: Value) -> anyhow::Result<Value> {
        anyhow::bail!("search backend unavailable")
    }
}

/// Tool that returns a plain string result
pub struct TextTool;

#[async_trait]
impl AgentTool for TextTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "text".to_string(),
            description: "Returns plain text".to_string(),
            parameters: json!({"type": "object"}),
        }
    }

    async fn invoke(&self, _arguments: Value) -> anyhow::Result<Value> {
        Ok(Value::String("three results found".to_string()))
    }
}

// =============================================================================
// In-memory Persistence
// =============================================================================

#[derive(Default)]
struct MemoryState {
    conversations: HashMap<Uuid, StoredConversation>,
    messages: Vec<Message>,
}

struct StoredConversation {
    user_id: Uuid,
    title: Option<String>,
    updated_at: chrono::DateTime<Utc>,
}

/// In-memory implementation of the persistence contract
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_of(&self, conversation_id: Uuid) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .conversations
            .get(&conversation_id)
            .and_then(|c| c.title.clone())
    }
}

#[async_trait]
impl ConversationPersistence for MemoryRepository {
    async fn upsert_conversation(&self, conversation_id: Uuid, user_id: Uuid) -> AgentResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .conversations
            .entry(conversation_id)
            .or_insert_with(|| StoredConversation {
                user_id,
                title: None,
                updated_at: Utc::now(),
            });
        Ok(())
    }

    async fn insert_message(&self, input: CreateMessage) -> AgentResult<Message> {
        let mut state = self.state.lock().unwrap();
        let conversation = state
            .conversations
            .get_mut(&input.conversation_id)
            .filter(|c| c.user_id == input.user_id)
            .ok_or_else(|| AgentError::Storage("conversation not found".to_string()))?;

        let now = Utc::now();
        conversation.updated_at = now;

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: input.conversation_id,
            user_id: input.user_id,
            role: input.role,
            content: input.content,
            data: input.data,
            created_at: now,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn count_messages(&self, conversation_id: Uuid, user_id: Uuid) -> AgentResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.user_id == user_id)
            .count() as i64)
    }

    async fn find_recent_messages(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        limit: i64,
    ) -> AgentResult<Vec<Message>> {
        let state = self.state.lock().unwrap();
        let matching: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.user_id == user_id)
            .cloned()
            .collect();

        let skip = matching.len().saturating_sub(limit.max(0) as usize);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn set_conversation_title(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        title: &str,
    ) -> AgentResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(conversation) = state
            .conversations
            .get_mut(&conversation_id)
            .filter(|c| c.user_id == user_id)
        {
            conversation.title = Some(title.to_string());
        }
        Ok(())
    }

    async fn find_conversations(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AgentResult<Vec<ConversationSummary>> {
        let state = self.state.lock().unwrap();
        let mut summaries: Vec<ConversationSummary> = state
            .conversations
            .iter()
            .filter(|(_, c)| c.user_id == user_id)
            .map(|(id, c)| ConversationSummary {
                id: *id,
                title: c.title.clone(),
                updated_at: c.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries.truncate(limit.max(0) as usize);
        Ok(summaries)
    }
}
