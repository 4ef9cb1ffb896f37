//! Per-user preference tracking
//!
//! Rolling genre and artist affinity counters inferred from message text
//! and tool result sets. Deliberately best-effort: in-process only, no
//! decay, no persistence. The counters feed the context builder as a soft
//! ranking hint, never as a source of truth.

use std::collections::HashMap;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::config::AgentConfig;

/// Genre and artist mention counters for one user
#[derive(Debug, Clone, Default)]
pub struct UserPreferences {
    pub genres: HashMap<String, u64>,
    pub artists: HashMap<String, u64>,
}

/// Process-lifetime interest profiles, keyed by user
///
/// Backed by a concurrent map so handler tasks update it without external
/// locking.
pub struct PreferenceTracker {
    profiles: DashMap<Uuid, UserPreferences>,
    genre_vocabulary: Vec<String>,
}

impl PreferenceTracker {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            profiles: DashMap::new(),
            genre_vocabulary: config.genre_vocabulary.clone(),
        }
    }

    /// Count genre mentions in a user message
    ///
    /// Case-insensitive substring match against the configured vocabulary;
    /// each distinct matching term increments its counter by one.
    pub fn update_from_message(&self, user_id: Uuid, text: &str) {
        let lowered = text.to_lowercase();
        let mut profile = self.profiles.entry(user_id).or_default();

        for genre in &self.genre_vocabulary {
            if lowered.contains(genre.as_str()) {
                *profile.genres.entry(genre.clone()).or_insert(0) += 1;
            }
        }
    }

    /// Count genres and artist names in a tool result's track list
    ///
    /// Tolerates both result shapes the tools produce: tracks at the top
    /// level (`result.tracks`) or nested under `result.data.tracks`.
    pub fn update_from_results(&self, user_id: Uuid, result: &Value) {
        let tracks = result
            .get("tracks")
            .or_else(|| result.get("data").and_then(|d| d.get("tracks")))
            .and_then(Value::as_array);

        let Some(tracks) = tracks else {
            debug!(%user_id, "Result carries no track list, skipping preference update");
            return;
        };

        let mut profile = self.profiles.entry(user_id).or_default();
        for track in tracks {
            if let Some(genre) = track.get("genre").and_then(Value::as_str) {
                *profile.genres.entry(genre.to_lowercase()).or_insert(0) += 1;
            }
            let artist = track
                .get("artist_name")
                .or_else(|| track.get("artist"))
                .and_then(Value::as_str);
            if let Some(artist) = artist {
                *profile.artists.entry(artist.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// The user's single highest-count genre, if any
    pub fn top_genre(&self, user_id: Uuid) -> Option<String> {
        let profile = self.profiles.get(&user_id)?;
        profile
            .genres
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(genre, _)| genre.clone())
    }

    /// Snapshot of a user's profile
    pub fn preferences(&self, user_id: Uuid) -> Option<UserPreferences> {
        self.profiles.get(&user_id).map(|p| p.clone())
    }
}
