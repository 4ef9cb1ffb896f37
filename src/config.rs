//! Agent configuration

use std::env;

use anyhow::{bail, Context, Result};

/// Default vocabulary for genre mention matching
///
/// The preference tracker matches these as case-insensitive substrings of
/// user messages. The list is a tunable input, not a business rule; deploys
/// targeting other catalogs override it via [`AgentConfig::genre_vocabulary`].
const DEFAULT_GENRE_VOCABULARY: &[&str] = &[
    "amapiano",
    "afro house",
    "afrobeats",
    "afropop",
    "gqom",
    "gospel",
    "highlife",
    "hip hop",
    "house",
    "jazz",
    "kwaito",
    "r&b",
    "reggae",
    "rock",
    "soul",
];

/// Configuration for the agent core
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum model/tool iterations per request (default: 6, must be >= 1)
    pub max_tool_iterations: usize,

    /// Number of recent messages included in the context summary (default: 6)
    pub context_message_limit: i64,

    /// Maximum length of the context summary; the tail is kept (default: 500)
    pub summary_max_chars: usize,

    /// Maximum length of an auto-generated conversation title (default: 60)
    pub title_max_chars: usize,

    /// Maximum conversations returned by the listing query (default: 20)
    pub conversation_list_limit: i64,

    /// Genre terms matched against user messages for preference tracking
    pub genre_vocabulary: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: 6,
            context_message_limit: 6,
            summary_max_chars: 500,
            title_max_chars: 60,
            conversation_list_limit: 20,
            genre_vocabulary: DEFAULT_GENRE_VOCABULARY
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    ///
    /// Recognized variables:
    /// - `AGENT_MAX_TOOL_ITERATIONS`
    /// - `AGENT_CONTEXT_MESSAGE_LIMIT`
    /// - `AGENT_SUMMARY_MAX_CHARS`
    /// - `AGENT_TITLE_MAX_CHARS`
    /// - `AGENT_CONVERSATION_LIST_LIMIT`
    /// - `AGENT_GENRE_VOCABULARY` (comma-separated)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            max_tool_iterations: parse_var(
                "AGENT_MAX_TOOL_ITERATIONS",
                defaults.max_tool_iterations,
            )?,
            context_message_limit: parse_var(
                "AGENT_CONTEXT_MESSAGE_LIMIT",
                defaults.context_message_limit,
            )?,
            summary_max_chars: parse_var("AGENT_SUMMARY_MAX_CHARS", defaults.summary_max_chars)?,
            title_max_chars: parse_var("AGENT_TITLE_MAX_CHARS", defaults.title_max_chars)?,
            conversation_list_limit: parse_var(
                "AGENT_CONVERSATION_LIST_LIMIT",
                defaults.conversation_list_limit,
            )?,
            genre_vocabulary: match env::var("AGENT_GENRE_VOCABULARY") {
                Ok(raw) => raw
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
                Err(_) => defaults.genre_vocabulary,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the executor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_tool_iterations == 0 {
            bail!("AGENT_MAX_TOOL_ITERATIONS must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {} value", name)),
        Err(_) => Ok(default),
    }
}
