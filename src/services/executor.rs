//! Tool-calling executor loop
//!
//! The core control loop of the agent: repeatedly invoke the bound model,
//! execute any tool calls it requests against the supplied tool set, feed
//! results back as transcript messages, and stop on a tool-call-free reply
//! or the iteration ceiling. Individual tool failures never abort the loop;
//! they become structured error results the model can see and react to.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::error::{AgentError, AgentResult};
use crate::models::chat::{ChatRole, ToolCall};

/// Fallback reply when the model never produced an assistant message
const FALLBACK_RESPONSE: &str =
    "I wasn't able to complete that request. Please try again in a moment.";

/// A message in the in-flight transcript sent to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl TranscriptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// A tool-result message keyed to the originating call id
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// One turn of model output: free text plus zero or more tool calls
#[derive(Debug, Clone)]
pub struct AssistantTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl From<&AssistantTurn> for TranscriptMessage {
    fn from(turn: &AssistantTurn) -> Self {
        TranscriptMessage {
            role: ChatRole::Assistant,
            content: turn.content.clone(),
            tool_calls: if turn.tool_calls.is_empty() {
                None
            } else {
                Some(turn.tool_calls.clone())
            },
            tool_call_id: None,
        }
    }
}

/// Declaration of a callable tool, surfaced to the model at bind time
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments
    pub parameters: Value,
}

/// A model capable of tool binding
pub trait ChatModel: Send + Sync {
    /// Bind a tool set, yielding an invocable handle. Binding happens once
    /// per executor run and is reused across iterations.
    fn bind_tools(&self, tools: Vec<ToolDefinition>) -> Arc<dyn BoundModel>;
}

/// A model with a tool set bound, ready to invoke
#[async_trait]
pub trait BoundModel: Send + Sync {
    async fn invoke(&self, messages: &[TranscriptMessage]) -> anyhow::Result<AssistantTurn>;
}

/// A callable tool the model may request
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool. Errors are absorbed by the loop and fed back to
    /// the model as structured error results.
    async fn invoke(&self, arguments: Value) -> anyhow::Result<Value>;
}

/// Record of one tool invocation within a loop run
///
/// Ephemeral: returned to the caller for logging and telemetry, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedToolCall {
    pub call_id: String,
    pub tool_name: String,
    /// Arguments exactly as the model sent them (string or object)
    pub raw_arguments: Value,
    /// Arguments after defensive parsing; `{}` if the raw form was
    /// malformed JSON
    pub parsed_arguments: Value,
    pub raw_result: Option<Value>,
    pub parsed_result: Option<Value>,
    pub error: Option<String>,
}

/// Outcome of a full executor run
#[derive(Debug, Clone)]
pub struct ToolLoopOutcome {
    /// The final assistant message (fabricated fallback if the model never
    /// produced one)
    pub final_message: TranscriptMessage,
    /// The complete transcript including tool-result messages
    pub transcript: Vec<TranscriptMessage>,
    /// Every tool call executed, in order
    pub tool_calls: Vec<ExecutedToolCall>,
    /// Model invocations actually performed
    pub iterations: usize,
    /// True when the loop ended at the iteration ceiling (or a model
    /// failure) rather than on a tool-call-free reply
    pub truncated: bool,
}

/// Drives the model/tool request loop
pub struct ToolCallExecutor {
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn AgentTool>>,
    max_iterations: usize,
}

impl std::fmt::Debug for ToolCallExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallExecutor")
            .field("tools", &self.tools.len())
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl ToolCallExecutor {
    /// Create an executor over a model and tool set
    ///
    /// Returns `AgentError::InvalidInput` if `max_iterations` is zero; a
    /// loop that may never invoke the model is a configuration mistake.
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Vec<Arc<dyn AgentTool>>,
        max_iterations: usize,
    ) -> AgentResult<Self> {
        if max_iterations == 0 {
            return Err(AgentError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            model,
            tools,
            max_iterations,
        })
    }

    /// Run the loop over an initial message list
    ///
    /// Infallible by design: unknown tools, tool exceptions, malformed
    /// arguments, and iteration exhaustion all resolve into the returned
    /// outcome rather than an error.
    #[instrument(skip(self, initial), fields(messages = initial.len(), tools = self.tools.len()))]
    pub async fn run(&self, initial: Vec<TranscriptMessage>) -> ToolLoopOutcome {
        let definitions = self.tools.iter().map(|t| t.definition()).collect();
        let bound = self.model.bind_tools(definitions);

        let mut transcript = initial;
        let mut executed: Vec<ExecutedToolCall> = Vec::new();
        let mut last_assistant: Option<TranscriptMessage> = None;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            let turn = match bound.invoke(&transcript).await {
                Ok(turn) => turn,
                Err(e) => {
                    warn!(iteration = iterations, error = %e, "Model invocation failed");
                    break;
                }
            };

            let assistant_message = TranscriptMessage::from(&turn);
            transcript.push(assistant_message.clone());

            if turn.tool_calls.is_empty() {
                debug!(iterations, "Final answer received");
                return ToolLoopOutcome {
                    final_message: assistant_message,
                    transcript,
                    tool_calls: executed,
                    iterations,
                    truncated: false,
                };
            }
            last_assistant = Some(assistant_message);

            debug!(
                iteration = iterations,
                count = turn.tool_calls.len(),
                "Processing tool calls"
            );

            // Sequential on purpose: each result must land in the
            // transcript before the next call runs, and all of a turn's
            // results before the next model invocation.
            for call in &turn.tool_calls {
                let (record, content) = self.execute_tool(call).await;
                transcript.push(TranscriptMessage::tool_result(call.id.clone(), content));
                executed.push(record);
            }
        }

        let final_message = match last_assistant {
            Some(message) => {
                warn!(iterations, "Tool loop ended without a tool-call-free reply");
                message
            }
            None => {
                warn!("Model produced no assistant message; returning fallback");
                let fallback = TranscriptMessage::assistant(FALLBACK_RESPONSE);
                transcript.push(fallback.clone());
                fallback
            }
        };

        ToolLoopOutcome {
            final_message,
            transcript,
            tool_calls: executed,
            iterations,
            truncated: true,
        }
    }

    /// Execute a single tool call, absorbing every failure mode
    ///
    /// Returns the execution record and the content for the tool-result
    /// transcript message.
    #[instrument(skip(self, call), fields(tool = %call.function.name, call_id = %call.id))]
    async fn execute_tool(&self, call: &ToolCall) -> (ExecutedToolCall, String) {
        let tool_name = call.function.name.clone();
        let parsed_arguments = parse_arguments(&call.function.arguments);

        let Some(tool) = self
            .tools
            .iter()
            .find(|t| t.definition().name == tool_name)
        else {
            let message = format!("Tool {} not found", tool_name);
            warn!(%message, "Requested tool is not in the bound set");
            let payload = json!({ "error": message });
            return (
                ExecutedToolCall {
                    call_id: call.id.clone(),
                    tool_name,
                    raw_arguments: call.function.arguments.clone(),
                    parsed_arguments,
                    raw_result: Some(payload.clone()),
                    parsed_result: Some(payload.clone()),
                    error: Some(message),
                },
                payload.to_string(),
            );
        };

        match tool.invoke(parsed_arguments.clone()).await {
            Ok(raw_result) => {
                let parsed_result = parse_result(&raw_result);
                let content = render_result(&raw_result);
                (
                    ExecutedToolCall {
                        call_id: call.id.clone(),
                        tool_name,
                        raw_arguments: call.function.arguments.clone(),
                        parsed_arguments,
                        raw_result: Some(raw_result),
                        parsed_result: Some(parsed_result),
                        error: None,
                    },
                    content,
                )
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Tool execution failed");
                let payload = json!({ "error": message });
                (
                    ExecutedToolCall {
                        call_id: call.id.clone(),
                        tool_name,
                        raw_arguments: call.function.arguments.clone(),
                        parsed_arguments,
                        raw_result: Some(payload.clone()),
                        parsed_result: Some(payload.clone()),
                        error: Some(message),
                    },
                    payload.to_string(),
                )
            }
        }
    }
}

/// Parse tool-call arguments defensively
///
/// Models deliver arguments either as a JSON-encoded string or as an
/// already-structured object. Structured values pass through unchanged; a
/// string is parsed, and a parse failure falls back to an empty object
/// rather than aborting the loop.
fn parse_arguments(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|e| {
            debug!(error = %e, "Malformed tool arguments, defaulting to empty object");
            json!({})
        }),
        other => other.clone(),
    }
}

/// Best-effort JSON parse of a tool result
///
/// A string result that happens to be valid JSON is parsed for the
/// caller's convenience; anything else is kept as-is.
fn parse_result(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    }
}

/// Render a tool result as transcript content
///
/// Plain string results are passed through verbatim so they are not
/// double-JSON-encoded; structured results are stringified.
fn render_result(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments_object_passthrough() {
        let raw = json!({"query": "amapiano", "limit": 5});
        assert_eq!(parse_arguments(&raw), raw);
    }

    #[test]
    fn test_parse_arguments_json_string() {
        let raw = Value::String(r#"{"query": "gqom"}"#.to_string());
        assert_eq!(parse_arguments(&raw), json!({"query": "gqom"}));
    }

    #[test]
    fn test_parse_arguments_malformed_falls_back_to_empty() {
        let raw = Value::String("{not json".to_string());
        assert_eq!(parse_arguments(&raw), json!({}));
    }

    #[test]
    fn test_render_result_string_not_double_encoded() {
        let raw = Value::String("three tracks found".to_string());
        assert_eq!(render_result(&raw), "three tracks found");
    }

    #[test]
    fn test_render_result_object_stringified() {
        let raw = json!({"count": 2});
        let content = render_result(&raw);
        let back: Value = serde_json::from_str(&content).expect("content should be valid JSON");
        assert_eq!(back, raw);
    }

    #[test]
    fn test_parse_result_json_string() {
        let raw = Value::String(r#"{"tracks": []}"#.to_string());
        assert_eq!(parse_result(&raw), json!({"tracks": []}));
    }

    #[test]
    fn test_parse_result_plain_string_kept() {
        let raw = Value::String("no results".to_string());
        assert_eq!(parse_result(&raw), raw);
    }

    #[test]
    fn test_assistant_turn_into_message() {
        let turn = AssistantTurn {
            content: "done".to_string(),
            tool_calls: vec![],
        };
        let msg = TranscriptMessage::from(&turn);
        assert_eq!(msg.role, ChatRole::Assistant);
        assert!(msg.tool_calls.is_none());
    }
}
