//! Sans-IO playback state machines.
//!
//! Nothing in here spawns tasks, sleeps or talks to an engine. Every
//! operation returns the [`Effect`]s the caller has to carry out, and every
//! effect that eventually completes carries a [`Ticket`]. Feeding the ticket
//! back through [`Controller::resume`](controller::Controller::resume) is the
//! only way a chain continues, and a ticket from a superseded or stopped
//! chain is silently ignored there.
//!
//! # Components
//!
//! - [`segmenter`] - splits a sentence at `/` and `//` pause markers
//! - [`queue`] - flattens scenes, lines, sentences and sections into units
//! - [`session`] - the live-session counter behind every guard check
//! - [`sequencer`] - walks one unit queue
//! - [`word_loop`] - repeats one word until released
//! - [`controller`] - the trigger surface tying the two loops together

pub mod controller;
pub mod queue;
pub mod segmenter;
pub mod sequencer;
pub mod session;
pub mod word_loop;

use std::time::Duration;

use crate::config::SpeechParams;

pub use controller::Controller;
pub use sequencer::{PlaybackBehavior, SequenceTicket, Sequencer, BLANK_UNIT_DELAY};
pub use word_loop::{WordLoop, WordLoopState, WordTicket};

/// Continuation data attached to every effect that completes later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ticket {
    Sequence(SequenceTicket),
    Word(WordTicket),
}

/// One utterance to hand to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub params: SpeechParams,
    pub ticket: Ticket,
}

/// Work the driver performs on behalf of the state machines.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Speak, then resume with the utterance's ticket (success or failure).
    Speak(Utterance),
    /// Wait `delay`, then resume with `ticket`.
    Wait { delay: Duration, ticket: Ticket },
    /// Best-effort cancel of everything the engine is speaking.
    CancelSpeech,
    /// Drop every pending wait.
    CancelTimers,
}
