#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tts_sequencer::{
    Line, Player, PlayerSnapshot, Section, SpeechEngine, SpeechError, SpeechParams, Voice,
};

pub const UTTERANCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SpokenCall {
    pub text: String,
    pub voice: Option<String>,
    pub at: Instant,
}

/// Engine that takes [`UTTERANCE`] per call and never really interrupts,
/// so late completions after a stop are always delivered.
pub struct ScriptedEngine {
    available: AtomicBool,
    fail_on: Vec<String>,
    voices: Vec<Voice>,
    calls: Mutex<Vec<SpokenCall>>,
    cancels: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Self::build(Vec::new(), Vec::new())
    }

    pub fn failing_on(texts: &[&str]) -> Arc<Self> {
        Self::build(texts.iter().map(|t| t.to_string()).collect(), Vec::new())
    }

    pub fn with_voices(voices: Vec<Voice>) -> Arc<Self> {
        Self::build(Vec::new(), voices)
    }

    fn build(fail_on: Vec<String>, voices: Vec<Voice>) -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(true),
            fail_on,
            voices,
            calls: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SpokenCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.text).collect()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn speak(&self, text: &str, params: &SpeechParams) -> Result<(), SpeechError> {
        self.calls.lock().unwrap().push(SpokenCall {
            text: text.to_string(),
            voice: params.voice.clone(),
            at: Instant::now(),
        });
        tokio::time::sleep(UTTERANCE).await;
        if self.fail_on.iter().any(|t| t == text) {
            Err(SpeechError::Failed("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn cancel_all(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        Ok(self.voices.clone())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn line(id: u64, sentences: &[&str]) -> Line {
    Line {
        id,
        speaker: "Anna".to_string(),
        sentences: sentences.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn section(sentences: &[&str]) -> Section {
    Section {
        id: 7,
        title: "Chapter".to_string(),
        sentences: sentences.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn voice(id: &str, name: &str, language: &str) -> Voice {
    Voice {
        id: id.to_string(),
        name: name.to_string(),
        language: Some(language.to_string()),
    }
}

/// Wait until a published snapshot satisfies `pred`.
pub async fn wait_until(player: &Player, pred: impl FnMut(&PlayerSnapshot) -> bool) {
    let mut snapshots = player.subscribe();
    tokio::time::timeout(Duration::from_secs(600), snapshots.wait_for(pred))
        .await
        .expect("timed out waiting for player")
        .expect("player runtime gone");
}

/// Let paused time run forward so pending speaks and waits play out.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}
