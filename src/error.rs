/// Errors reported by a [`SpeechEngine`](crate::SpeechEngine) for a single utterance
/// or voice query.
///
/// Playback never stops because of one of these: a failed utterance is
/// treated exactly like a finished one.
#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("Speech engine is not available in this environment")]
    Unavailable,
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Utterance was interrupted")]
    Interrupted,
    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

/// Errors surfaced at the player boundary.
#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("No speech engine is available. Playback is disabled.")]
    EngineUnavailable,
    #[error("Player has shut down")]
    PlayerClosed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(String),
}
