use std::time::Duration;

use serde::Serialize;

use super::queue::{PlaybackQueue, PlaybackScope, PlaybackUnit, UnitKey};
use super::segmenter::{segment, Segment};
use super::session::{SessionCounter, SessionToken};
use super::{Effect, Ticket, Utterance};
use crate::config::{PlaybackConfig, SpeechParams};

/// How long a blank unit stays highlighted before the chain moves on.
pub const BLANK_UNIT_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SequencerState {
    #[default]
    Idle,
    Playing,
}

/// What happens after a unit has been spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackBehavior {
    /// Replay the same unit instead of advancing, until stopped.
    pub repeat_current: bool,
    /// Times each speak call is made before moving on. 0 is read as 1.
    pub repeat_count: u32,
}

impl Default for PlaybackBehavior {
    fn default() -> Self {
        Self {
            repeat_current: false,
            repeat_count: 1,
        }
    }
}

impl PlaybackBehavior {
    /// Behavior of a chain of `scope` under `config`. Scene and line chains
    /// never repeat the current unit.
    pub fn for_scope(scope: PlaybackScope, config: &PlaybackConfig) -> Self {
        Self {
            repeat_current: scope.allows_repeat() && config.repeat_current,
            repeat_count: config.effective_repeat_count(),
        }
    }
}

/// Continuation of a sequencer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTicket {
    session: SessionToken,
    scope: PlaybackScope,
    index: usize,
    /// Stamp of the one continuation the chain is waiting for.
    step: u64,
    resume: Resume,
}

impl SequenceTicket {
    pub fn session(&self) -> SessionToken {
        self.session
    }

    pub fn scope(&self) -> PlaybackScope {
        self.scope
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    /// Pass `pass` of a segment finished speaking.
    Spoken { segment: usize, pass: u32 },
    /// The gap before `next` elapsed.
    Gap { next: usize },
    /// The blank-unit delay elapsed.
    Blank,
}

#[derive(Debug)]
struct Chain {
    queue: PlaybackQueue,
    behavior: PlaybackBehavior,
    current: Option<UnitProgress>,
    awaiting: u64,
}

/// The unit being spoken, with the auto-pause snapshot taken when it
/// started. Empty `segments` means a blank unit.
#[derive(Debug)]
struct UnitProgress {
    index: usize,
    segments: Vec<Segment>,
    pause: Duration,
}

/// Walks a [`PlaybackQueue`] one unit at a time.
///
/// A chain lives from [`start`](Self::start) until it runs off the end of
/// its queue, is stopped, or is replaced by another `start`. Every
/// continuation is checked against the live session token, the live scope
/// and the stopped flag before it may touch any state. Engine cancellation
/// is not relied on.
#[derive(Debug, Default)]
pub struct Sequencer {
    sessions: SessionCounter,
    live_scope: Option<PlaybackScope>,
    chain: Option<Chain>,
    highlight: Option<UnitKey>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SequencerState {
        if self.chain.is_some() {
            SequencerState::Playing
        } else {
            SequencerState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == SequencerState::Playing
    }

    /// The unit currently speaking (or waiting out its blank delay).
    pub fn highlight(&self) -> Option<&UnitKey> {
        self.highlight.as_ref()
    }

    /// Scope and queue index of the live chain's current unit.
    pub fn position(&self) -> Option<(PlaybackScope, usize)> {
        let chain = self.chain.as_ref()?;
        let current = chain.current.as_ref()?;
        Some((chain.queue.scope(), current.index))
    }

    /// Stop whatever is playing, then play `queue` from `start_index`.
    pub fn start(
        &mut self,
        queue: PlaybackQueue,
        start_index: usize,
        behavior: PlaybackBehavior,
        config: &PlaybackConfig,
    ) -> Vec<Effect> {
        let mut effects = self.stop();
        let session = self.sessions.begin();
        let scope = queue.scope();
        log::debug!(
            "Starting {scope:?} playback {session}: {} units from index {start_index}",
            queue.len()
        );

        self.live_scope = Some(scope);
        self.chain = Some(Chain {
            queue,
            behavior,
            current: None,
            awaiting: 0,
        });
        effects.extend(self.advance(session, start_index, config));
        effects
    }

    /// Invalidate the live chain. Idempotent.
    ///
    /// Any continuation of the stopped chain that still arrives later is a
    /// no-op, whether or not the engine honoured the cancel request.
    pub fn stop(&mut self) -> Vec<Effect> {
        self.sessions.stop();
        if let Some(chain) = self.chain.take() {
            log::debug!("Stopping {:?} playback", chain.queue.scope());
        }
        self.live_scope = None;
        self.highlight = None;
        vec![Effect::CancelTimers, Effect::CancelSpeech]
    }

    /// Update `repeat_current` on the live chain, if its scope repeats at all.
    pub fn set_repeat_current(&mut self, repeat_current: bool) {
        if let Some(chain) = self.chain.as_mut() {
            if chain.queue.scope().allows_repeat() {
                chain.behavior.repeat_current = repeat_current;
            }
        }
    }

    /// Continue the chain `ticket` belongs to, if it is still live.
    pub fn resume(&mut self, ticket: &SequenceTicket, config: &PlaybackConfig) -> Vec<Effect> {
        if !self.admits(ticket) {
            log::trace!("Dropping stale continuation {ticket:?}");
            return Vec::new();
        }

        match ticket.resume {
            Resume::Blank => self.unit_finished(ticket, config),
            Resume::Gap { next } => self.speak_segment(ticket, next, 0, &config.speech),
            Resume::Spoken { segment, pass } => self.segment_spoken(ticket, segment, pass, config),
        }
    }

    /// Repeat the segment, wait out its gap, move to the next segment, or
    /// finish the unit, in that order.
    fn segment_spoken(
        &mut self,
        ticket: &SequenceTicket,
        segment: usize,
        pass: u32,
        config: &PlaybackConfig,
    ) -> Vec<Effect> {
        let Some((repeats, gap, has_next)) = self.chain.as_ref().and_then(|chain| {
            let progress = chain.current.as_ref()?;
            let seg = progress.segments.get(segment)?;
            Some((
                chain.behavior.repeat_count.max(1),
                seg.gap_after.then_some(progress.pause),
                segment + 1 < progress.segments.len(),
            ))
        }) else {
            return Vec::new();
        };

        if pass + 1 < repeats {
            return self.speak_segment(ticket, segment, pass + 1, &config.speech);
        }
        if !has_next {
            return self.unit_finished(ticket, config);
        }
        match gap {
            Some(delay) => {
                let next = self.issue(ticket, Resume::Gap { next: segment + 1 });
                vec![Effect::Wait {
                    delay,
                    ticket: Ticket::Sequence(next),
                }]
            }
            None => self.speak_segment(ticket, segment + 1, 0, &config.speech),
        }
    }

    fn admits(&self, ticket: &SequenceTicket) -> bool {
        self.sessions.is_live(ticket.session)
            && self.live_scope == Some(ticket.scope)
            && self.chain.as_ref().is_some_and(|chain| {
                chain.awaiting == ticket.step
                    && chain
                        .current
                        .as_ref()
                        .is_some_and(|progress| progress.index == ticket.index)
            })
    }

    /// Stamp a new continuation; earlier ones of this chain stop matching.
    fn issue(&mut self, base: &SequenceTicket, resume: Resume) -> SequenceTicket {
        let step = match self.chain.as_mut() {
            Some(chain) => {
                chain.awaiting += 1;
                chain.awaiting
            }
            None => 0,
        };
        SequenceTicket {
            step,
            resume,
            ..*base
        }
    }

    fn current(&self) -> Option<&UnitProgress> {
        self.chain.as_ref()?.current.as_ref()
    }

    fn advance(
        &mut self,
        session: SessionToken,
        index: usize,
        config: &PlaybackConfig,
    ) -> Vec<Effect> {
        let Some(chain) = self.chain.as_ref() else {
            return Vec::new();
        };
        let scope = chain.queue.scope();
        let Some(unit) = chain.queue.get(index).cloned() else {
            log::debug!("{scope:?} playback {session} finished");
            self.finish();
            return Vec::new();
        };

        self.highlight = Some(unit.key.clone());
        let segments = speakable_segments(&unit, config);
        let blank = segments.is_empty();
        if let Some(chain) = self.chain.as_mut() {
            chain.current = Some(UnitProgress {
                index,
                segments,
                pause: config.auto_pause.pause(),
            });
        }

        let base = SequenceTicket {
            session,
            scope,
            index,
            step: 0,
            resume: Resume::Blank,
        };
        if blank {
            log::trace!("Unit {} is blank, skipping after delay", unit.key);
            let ticket = self.issue(&base, Resume::Blank);
            return vec![Effect::Wait {
                delay: BLANK_UNIT_DELAY,
                ticket: Ticket::Sequence(ticket),
            }];
        }
        self.speak_segment(&base, 0, 0, &config.speech)
    }

    fn speak_segment(
        &mut self,
        base: &SequenceTicket,
        segment: usize,
        pass: u32,
        params: &SpeechParams,
    ) -> Vec<Effect> {
        let Some(text) = self
            .current()
            .and_then(|p| p.segments.get(segment))
            .map(|seg| seg.text.clone())
        else {
            return Vec::new();
        };
        let ticket = self.issue(base, Resume::Spoken { segment, pass });
        vec![Effect::Speak(Utterance {
            text,
            params: params.clone(),
            ticket: Ticket::Sequence(ticket),
        })]
    }

    fn unit_finished(&mut self, ticket: &SequenceTicket, config: &PlaybackConfig) -> Vec<Effect> {
        let Some(chain) = self.chain.as_ref() else {
            return Vec::new();
        };
        let Some(progress) = chain.current.as_ref() else {
            return Vec::new();
        };

        let next = if chain.behavior.repeat_current {
            progress.index
        } else {
            progress.index + 1
        };
        self.advance(ticket.session, next, config)
    }

    fn finish(&mut self) {
        self.sessions.stop();
        self.chain = None;
        self.live_scope = None;
        self.highlight = None;
    }
}

/// Segments to speak for `unit`, or none if nothing in it is speakable.
fn speakable_segments(unit: &PlaybackUnit, config: &PlaybackConfig) -> Vec<Segment> {
    if unit.is_blank() {
        return Vec::new();
    }
    let segments = segment(&unit.text, &config.auto_pause);
    if segments.iter().all(|s| s.text.is_empty()) {
        return Vec::new();
    }
    segments
}
