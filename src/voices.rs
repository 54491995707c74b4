use serde::{Deserialize, Serialize};

/// A voice an engine can speak with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Identifier passed back to the engine.
    pub id: String,
    /// Human-readable name, matched against the configured voice.
    pub name: String,
    /// Language tag such as `"en-US"` or `"ko"`.
    pub language: Option<String>,
}

impl Voice {
    pub fn speaks(&self, language_prefix: &str) -> bool {
        let prefix = language_prefix.to_ascii_lowercase();
        self.language
            .as_deref()
            .is_some_and(|lang| lang.to_ascii_lowercase().starts_with(&prefix))
    }
}

/// Pick the voice for an utterance.
///
/// The voice named `preferred` wins (matched by name or id). Without it, the
/// first voice for `language_prefix` is used. `None` leaves the choice to
/// the engine.
pub fn select_voice<'a>(
    voices: &'a [Voice],
    preferred: Option<&str>,
    language_prefix: &str,
) -> Option<&'a Voice> {
    preferred
        .filter(|name| *name != "default")
        .and_then(|name| voices.iter().find(|v| v.name == name || v.id == name))
        .or_else(|| voices.iter().find(|v| v.speaks(language_prefix)))
}
