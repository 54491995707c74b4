//! Speech engines.
//!
//! This module contains [`SpeechEngine`](crate::SpeechEngine) implementations.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `espeak` - speaks through a local `espeak-ng` binary (on by default)

#[cfg(feature = "espeak")]
pub mod espeak;
