//! Structured response-type registry
//!
//! The contract boundary between what the model may produce and what the
//! UI knows how to render. Each response type registers a renderer
//! reference, a prompt fragment, a JSON schema, metadata, and an optional
//! validator; the system prompt and response validation are both driven
//! off this one table so the two sides cannot drift.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{AgentError, AgentResult};

/// Coarse grouping used for prompt organization and telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseCategory {
    Discovery,
    Action,
    Info,
}

/// Custom validation hook for one response type
pub type ResponseValidator = fn(&Value) -> bool;

/// Registered handler for one structured response type
#[derive(Clone)]
pub struct ResponseHandler {
    /// UI component that renders this type
    pub component: &'static str,
    /// Fragment shown to the model describing when and how to emit this type
    pub prompt: String,
    /// JSON schema for the `data` payload
    pub schema: Value,
    pub category: ResponseCategory,
    /// Higher priority sorts earlier in the generated system prompt
    pub priority: i32,
    pub description: String,
    /// Optional validator beyond the baseline type/message check
    pub validator: Option<ResponseValidator>,
}

/// Write-once-per-type registry of structured response handlers
///
/// Built mutably during startup, then shared read-only behind an `Arc`.
pub struct ResponseRegistry {
    handlers: HashMap<String, ResponseHandler>,
}

impl ResponseRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a response type
    ///
    /// Registering the same type twice is a startup wiring mistake and
    /// fails with [`AgentError::DuplicateResponseType`].
    pub fn register(
        &mut self,
        response_type: impl Into<String>,
        handler: ResponseHandler,
    ) -> AgentResult<()> {
        let response_type = response_type.into();
        if self.handlers.contains_key(&response_type) {
            return Err(AgentError::DuplicateResponseType(response_type));
        }
        debug!(%response_type, component = handler.component, "Registered response type");
        self.handlers.insert(response_type, handler);
        Ok(())
    }

    /// Look up the handler for a type
    pub fn handler(&self, response_type: &str) -> Option<&ResponseHandler> {
        self.handlers.get(response_type)
    }

    /// Registered type tags, highest priority first
    pub fn types(&self) -> Vec<&str> {
        let mut entries: Vec<_> = self.handlers.iter().collect();
        entries.sort_by(|a, b| b.1.priority.cmp(&a.1.priority).then_with(|| a.0.cmp(b.0)));
        entries.into_iter().map(|(t, _)| t.as_str()).collect()
    }

    /// Render all registered types into the system-prompt bullet list
    ///
    /// Sorted by descending priority so the most important types lead; the
    /// routing layer includes the output verbatim.
    pub fn generate_system_prompt(&self) -> String {
        self.types()
            .into_iter()
            .map(|t| {
                let handler = &self.handlers[t];
                format!("- {}: {}", t, handler.prompt)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Validate a structured response
    ///
    /// Fails closed: a response must carry string `type` and `message`
    /// fields, the type must be registered, and any custom validator must
    /// accept it.
    pub fn validate_response(&self, response: &Value) -> bool {
        let Some(response_type) = response.get("type").and_then(Value::as_str) else {
            warn!("Response missing type field");
            return false;
        };
        if response.get("message").and_then(Value::as_str).is_none() {
            warn!(%response_type, "Response missing message field");
            return false;
        }

        let Some(handler) = self.handlers.get(response_type) else {
            warn!(%response_type, "Unregistered response type");
            return false;
        };

        match handler.validator {
            Some(validator) => validator(response),
            None => true,
        }
    }
}

impl Default for ResponseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry pre-populated with the platform's structured response types
///
/// Registration is static and happens once at process start; panicking on
/// a duplicate here would mean the table below itself is wrong.
pub fn default_registry() -> ResponseRegistry {
    let mut registry = ResponseRegistry::new();

    let entries = [
        (
            "track_list",
            ResponseHandler {
                component: "TrackList",
                prompt: "a set of tracks matching the user's request; put the tracks array in data"
                    .to_string(),
                schema: json!({
                    "type": "object",
                    "properties": {
                        "tracks": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "title": {"type": "string"},
                                    "artist_name": {"type": "string"},
                                    "genre": {"type": "string"}
                                },
                                "required": ["title"]
                            }
                        }
                    },
                    "required": ["tracks"]
                }),
                category: ResponseCategory::Discovery,
                priority: 30,
                description: "Ordered list of tracks for the result pane".to_string(),
                validator: None,
            },
        ),
        (
            "playlist",
            ResponseHandler {
                component: "PlaylistCard",
                prompt: "a playlist the user asked to build; data must carry name and tracks"
                    .to_string(),
                schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "tracks": {"type": "array"}
                    },
                    "required": ["name", "tracks"]
                }),
                category: ResponseCategory::Action,
                priority: 20,
                description: "Playlist proposal rendered as a card".to_string(),
                validator: Some(|response| {
                    response
                        .get("data")
                        .map(|d| {
                            d.get("name").and_then(Value::as_str).is_some()
                                && d.get("tracks").and_then(Value::as_array).is_some()
                        })
                        .unwrap_or(false)
                }),
            },
        ),
        (
            "artist_card",
            ResponseHandler {
                component: "ArtistCard",
                prompt: "a single artist profile; data carries the artist's name and bio"
                    .to_string(),
                schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "bio": {"type": "string"},
                        "genres": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["name"]
                }),
                category: ResponseCategory::Discovery,
                priority: 10,
                description: "Artist spotlight card".to_string(),
                validator: None,
            },
        ),
        (
            "info",
            ResponseHandler {
                component: "InfoText",
                prompt: "a plain informational answer with no structured payload".to_string(),
                schema: json!({"type": "object"}),
                category: ResponseCategory::Info,
                priority: 0,
                description: "Free-text answer".to_string(),
                validator: None,
            },
        ),
    ];

    for (response_type, handler) in entries {
        registry
            .register(response_type, handler)
            .expect("default response types registered once");
    }

    registry
}
