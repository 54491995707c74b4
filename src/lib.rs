//! # tts-sequencer
//!
//! Session-guarded speech playback for script and book study tools.
//!
//! The crate walks parsed text (scenes → character lines → sentences →
//! pause-delimited segments) through an asynchronous speech engine, one
//! utterance at a time, with interruption, repeat modes, auto-pause gaps and
//! a single-word pronunciation loop.
//!
//! ## Features
//!
//! - **Sequenced playback**: scene, line, sentence and book-section scopes
//! - **Auto-pause**: `/` and `//` markers in the text become timed silences
//! - **Word loop**: repeat one word until released, exclusive with playback
//! - **espeak-ng engine**: speaks through a local `espeak-ng` binary
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tts-sequencer = { version = "2026.2", features = ["espeak"] }
//! ```
//!
//! ```ignore
//! use std::sync::Arc;
//! use tts_sequencer::{engines::espeak::EspeakEngine, Player, PlaybackConfig};
//!
//! let player = Player::spawn(Arc::new(EspeakEngine::new()), PlaybackConfig::default());
//! player.play_scene(&scene)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The [`playback`] module is sans-IO: every operation returns a list of
//! [`Effect`](playback::Effect)s. The [`Player`] owns that state on a single
//! tokio task and executes the effects against a [`SpeechEngine`]. Each
//! completion comes back as a ticket, and the ticket is checked against the
//! live session before anything happens.

pub mod config;
pub mod engines;
pub mod error;
pub mod playback;
pub mod player;
pub mod voices;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use config::{PlaybackConfig, PlaybackConfigBuilder, SpeechParams};
pub use error::{PlaybackError, SpeechError};
pub use playback::queue::{Line, PlaybackQueue, PlaybackScope, PlaybackUnit, Scene, Section, UnitKey};
pub use playback::segmenter::{segment, AutoPauseConfig, PauseLevel, Segment};
pub use playback::sequencer::SequencerState;
pub use player::{Player, PlayerSnapshot};
pub use voices::Voice;

/// Direction for stepping through a book section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepDirection {
    Next,
    Prev,
}

/// Common interface for speech synthesis backends.
///
/// Implementations speak one utterance per [`speak`](Self::speak) call and
/// resolve the returned future when the utterance has finished, successfully
/// or not. [`cancel_all`](Self::cancel_all) is best-effort: an in-flight
/// `speak` may still complete normally afterwards.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Whether speech output is usable in this environment at all.
    fn is_available(&self) -> bool;

    /// Speak `text` and resolve once the utterance has ended.
    async fn speak(&self, text: &str, params: &SpeechParams) -> Result<(), SpeechError>;

    /// Ask the engine to drop everything it is speaking or has queued.
    fn cancel_all(&self);

    /// List the voices this engine can speak with.
    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError>;
}
