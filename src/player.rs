//! Tokio driver for the playback state machines.
//!
//! A [`Player`] owns one runtime task. That task is the only place
//! [`Controller`] state is touched: trigger calls, finished utterances and
//! elapsed waits all arrive as messages in its mailbox and are handled one
//! at a time.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::{PlaybackConfig, SpeechParams};
use crate::error::PlaybackError;
use crate::playback::queue::{Line, Scene, Section, UnitKey};
use crate::playback::sequencer::SequencerState;
use crate::playback::{Controller, Effect, Ticket, Utterance};
use crate::voices::{select_voice, Voice};
use crate::{SpeechEngine, StepDirection};

/// What the UI renders from: playback state, the unit to highlight, the
/// word being drilled and the section reading position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlayerSnapshot {
    pub state: SequencerState,
    pub highlight: Option<UnitKey>,
    pub word: Option<String>,
    pub reading_cursor: usize,
}

#[derive(Debug)]
enum Command {
    PlayScene(Scene),
    PlayLine(Line),
    PlaySentence { line: Line, index: usize },
    ReadSection { section: Section, from: Option<usize> },
    StepSection { section: Section, direction: StepDirection },
    StopAll,
    PressWord(String),
    ReleaseWord,
    SetConfig(PlaybackConfig),
    Shutdown,
}

#[derive(Debug)]
enum Message {
    Command(Command),
    Resume(Ticket),
}

/// Handle to a running playback runtime.
///
/// Trigger methods only post a message and return; the snapshot channel
/// reports what happened.
pub struct Player {
    engine: Arc<dyn SpeechEngine>,
    mailbox: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl Player {
    /// Start the runtime task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(engine: Arc<dyn SpeechEngine>, config: PlaybackConfig) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(PlayerSnapshot::default());

        let runtime = Runtime {
            controller: Controller::new(config),
            engine: Arc::clone(&engine),
            mailbox: mailbox.clone(),
            timers: Vec::new(),
            voices: Vec::new(),
            snapshot: snapshot_tx,
        };
        let task = tokio::spawn(runtime.run(inbox));

        Self {
            engine,
            mailbox,
            snapshot,
            task: Some(task),
        }
    }

    /// Whether the engine can speak at all. Play calls fail without it.
    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    pub fn play_scene(&self, scene: &Scene) -> Result<(), PlaybackError> {
        self.ensure_available()?;
        self.send(Command::PlayScene(scene.clone()))
    }

    pub fn play_line(&self, line: &Line) -> Result<(), PlaybackError> {
        self.ensure_available()?;
        self.send(Command::PlayLine(line.clone()))
    }

    pub fn play_sentence(&self, line: &Line, index: usize) -> Result<(), PlaybackError> {
        self.ensure_available()?;
        self.send(Command::PlaySentence {
            line: line.clone(),
            index,
        })
    }

    /// Read a book section continuously. See
    /// [`Controller::read_section`] for where it starts.
    pub fn read_section(&self, section: &Section, from: Option<usize>) -> Result<(), PlaybackError> {
        self.ensure_available()?;
        self.send(Command::ReadSection {
            section: section.clone(),
            from,
        })
    }

    pub fn step_section(
        &self,
        section: &Section,
        direction: StepDirection,
    ) -> Result<(), PlaybackError> {
        self.ensure_available()?;
        self.send(Command::StepSection {
            section: section.clone(),
            direction,
        })
    }

    pub fn stop_all(&self) -> Result<(), PlaybackError> {
        self.send(Command::StopAll)
    }

    /// Start drilling `word`. Ignored while sequence playback is running.
    pub fn press_word(&self, word: &str) -> Result<(), PlaybackError> {
        self.ensure_available()?;
        self.send(Command::PressWord(word.to_string()))
    }

    pub fn release_word(&self) -> Result<(), PlaybackError> {
        self.send(Command::ReleaseWord)
    }

    pub fn set_config(&self, config: PlaybackConfig) -> Result<(), PlaybackError> {
        config.validate()?;
        self.send(Command::SetConfig(config))
    }

    pub fn current_highlight(&self) -> Option<UnitKey> {
        self.snapshot.borrow().highlight.clone()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    /// Stop playback and wait for the runtime task to exit.
    pub async fn shutdown(mut self) {
        let _ = self.mailbox.send(Message::Command(Command::Shutdown));
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Player runtime ended abnormally: {e}");
            }
        }
    }

    fn ensure_available(&self) -> Result<(), PlaybackError> {
        if self.engine.is_available() {
            Ok(())
        } else {
            log::warn!("Speech engine unavailable, ignoring playback request");
            Err(PlaybackError::EngineUnavailable)
        }
    }

    fn send(&self, command: Command) -> Result<(), PlaybackError> {
        self.mailbox
            .send(Message::Command(command))
            .map_err(|_| PlaybackError::PlayerClosed)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.mailbox.send(Message::Command(Command::Shutdown));
        }
    }
}

struct Runtime {
    controller: Controller,
    engine: Arc<dyn SpeechEngine>,
    mailbox: mpsc::UnboundedSender<Message>,
    timers: Vec<JoinHandle<()>>,
    voices: Vec<Voice>,
    snapshot: watch::Sender<PlayerSnapshot>,
}

impl Runtime {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Message>) {
        match self.engine.list_voices().await {
            Ok(voices) => {
                log::debug!("Engine offers {} voices", voices.len());
                self.voices = voices;
            }
            Err(e) => log::warn!("Could not list voices, using engine default: {e}"),
        }

        while let Some(message) = inbox.recv().await {
            let shutdown = matches!(message, Message::Command(Command::Shutdown));
            let effects = match message {
                Message::Command(command) => self.handle(command),
                Message::Resume(ticket) => self.controller.resume(&ticket),
            };
            self.apply(effects);
            self.publish();
            if shutdown {
                break;
            }
        }
        log::debug!("Player runtime stopped");
    }

    fn handle(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::PlayScene(scene) => self.controller.play_scene(&scene),
            Command::PlayLine(line) => self.controller.play_line(&line),
            Command::PlaySentence { line, index } => self.controller.play_sentence(&line, index),
            Command::ReadSection { section, from } => self.controller.read_section(&section, from),
            Command::StepSection { section, direction } => {
                self.controller.step_section(&section, direction)
            }
            Command::StopAll | Command::Shutdown => self.controller.stop_all(),
            Command::PressWord(word) => self.controller.press_word(&word),
            Command::ReleaseWord => {
                self.controller.release_word();
                Vec::new()
            }
            Command::SetConfig(config) => {
                self.controller.set_config(config);
                Vec::new()
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Speak(utterance) => self.speak(utterance),
                Effect::Wait { delay, ticket } => {
                    self.timers.retain(|timer| !timer.is_finished());
                    let mailbox = self.mailbox.clone();
                    self.timers.push(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = mailbox.send(Message::Resume(ticket));
                    }));
                }
                Effect::CancelTimers => {
                    for timer in self.timers.drain(..) {
                        timer.abort();
                    }
                }
                Effect::CancelSpeech => self.engine.cancel_all(),
            }
        }
    }

    fn speak(&self, utterance: Utterance) {
        let Utterance {
            text,
            params,
            ticket,
        } = utterance;
        let params = self.resolve(&params);
        let engine = Arc::clone(&self.engine);
        let mailbox = self.mailbox.clone();

        tokio::spawn(async move {
            if let Err(e) = engine.speak(&text, &params).await {
                log::warn!("Utterance {text:?} failed, continuing: {e}");
            }
            let _ = mailbox.send(Message::Resume(ticket));
        });
    }

    /// Sanitize the params and map the preferred voice onto one the engine
    /// actually lists.
    fn resolve(&self, params: &SpeechParams) -> SpeechParams {
        let mut params = params.sanitized();
        if !self.voices.is_empty() {
            params.voice = select_voice(&self.voices, params.voice.as_deref(), &params.language)
                .map(|voice| voice.id.clone());
        }
        params
    }

    fn publish(&self) {
        let next = PlayerSnapshot {
            state: self.controller.state(),
            highlight: self.controller.highlight().cloned(),
            word: self.controller.word_loop().active_word().map(str::to_string),
            reading_cursor: self.controller.reading_cursor(),
        };
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
