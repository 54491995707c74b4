use super::queue::{Line, PlaybackQueue, PlaybackScope, Scene, Section, UnitKey};
use super::sequencer::{PlaybackBehavior, Sequencer, SequencerState};
use super::word_loop::WordLoop;
use super::{Effect, Ticket};
use crate::config::PlaybackConfig;
use crate::StepDirection;

/// Trigger surface over one [`Sequencer`] and one [`WordLoop`].
///
/// The two never run together: every play operation stops the word loop
/// before its first utterance, and a word press while sequence playback is
/// running is ignored.
#[derive(Debug, Default)]
pub struct Controller {
    config: PlaybackConfig,
    sequencer: Sequencer,
    word_loop: WordLoop,
    reading_cursor: usize,
}

impl Controller {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Replace the settings. Units already speaking keep their auto-pause
    /// snapshot; a live sentence or section chain picks up `repeat_current`.
    pub fn set_config(&mut self, config: PlaybackConfig) {
        self.sequencer.set_repeat_current(config.repeat_current);
        self.config = config;
    }

    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn highlight(&self) -> Option<&UnitKey> {
        self.sequencer.highlight()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn word_loop(&self) -> &WordLoop {
        &self.word_loop
    }

    /// Sentence index of section reading; follows section playback.
    pub fn reading_cursor(&self) -> usize {
        self.reading_cursor
    }

    pub fn play_scene(&mut self, scene: &Scene) -> Vec<Effect> {
        self.play(PlaybackQueue::scene(scene), 0)
    }

    pub fn play_line(&mut self, line: &Line) -> Vec<Effect> {
        self.play(PlaybackQueue::line(line), 0)
    }

    pub fn play_sentence(&mut self, line: &Line, index: usize) -> Vec<Effect> {
        self.play(PlaybackQueue::sentence(line, index), 0)
    }

    /// Read `section` continuously from `from`, or from the reading cursor.
    /// A cursor already on the last sentence starts over from the top.
    pub fn read_section(&mut self, section: &Section, from: Option<usize>) -> Vec<Effect> {
        let len = section.sentences.len();
        if len == 0 {
            return Vec::new();
        }
        let start = match from {
            Some(index) => index,
            None if self.reading_cursor >= len - 1 => 0,
            None => self.reading_cursor,
        };
        self.play(PlaybackQueue::section(section), start)
    }

    /// Move the reading cursor one sentence. Section playback that was
    /// running restarts from the new sentence.
    pub fn step_section(&mut self, section: &Section, direction: StepDirection) -> Vec<Effect> {
        let len = section.sentences.len();
        if len == 0 {
            return Vec::new();
        }
        let was_reading = matches!(self.sequencer.position(), Some((PlaybackScope::Section, _)));
        let next = match direction {
            StepDirection::Next => (self.reading_cursor + 1).min(len - 1),
            StepDirection::Prev => self.reading_cursor.saturating_sub(1).min(len - 1),
        };

        let mut effects = self.stop_all();
        self.reading_cursor = next;
        if was_reading {
            effects.extend(self.play(PlaybackQueue::section(section), next));
        }
        effects
    }

    pub fn stop_all(&mut self) -> Vec<Effect> {
        self.word_loop.stop();
        self.sequencer.stop()
    }

    pub fn press_word(&mut self, word: &str) -> Vec<Effect> {
        if self.sequencer.is_playing() {
            log::debug!("Ignoring word press while sequence playback is running");
            return Vec::new();
        }
        self.word_loop.start(word, &self.config.speech)
    }

    pub fn release_word(&mut self) {
        self.word_loop.stop();
    }

    /// Hand a completed speak or wait back to whichever loop issued it.
    pub fn resume(&mut self, ticket: &Ticket) -> Vec<Effect> {
        let effects = match ticket {
            Ticket::Sequence(ticket) => self.sequencer.resume(ticket, &self.config),
            Ticket::Word(ticket) => self.word_loop.resume(ticket, &self.config.speech),
        };
        self.track_reading();
        effects
    }

    fn play(&mut self, queue: PlaybackQueue, start: usize) -> Vec<Effect> {
        self.word_loop.stop();
        let behavior = PlaybackBehavior::for_scope(queue.scope(), &self.config);
        let effects = self.sequencer.start(queue, start, behavior, &self.config);
        self.track_reading();
        effects
    }

    fn track_reading(&mut self) {
        if let Some((PlaybackScope::Section, index)) = self.sequencer.position() {
            self.reading_cursor = index;
        }
    }
}
