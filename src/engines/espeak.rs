//! espeak-ng speech engine.
//!
//! Each utterance runs one `espeak-ng` process that plays straight to the
//! default audio device. Cancelling kills every process still speaking.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use tts_sequencer::engines::espeak::EspeakEngine;
//!
//! // Use espeak-ng from PATH
//! let engine = EspeakEngine::new();
//!
//! // Or point to a bundled binary and data directory
//! let bundled = EspeakEngine::with_espeak(
//!     Some(PathBuf::from("/app/resources/espeak-ng/espeak-ng")),
//!     Some(PathBuf::from("/app/resources/espeak-ng-data")),
//! );
//! ```

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Notify;

use crate::config::SpeechParams;
use crate::error::SpeechError;
use crate::voices::Voice;
use crate::SpeechEngine;

/// espeak-ng speaking rate at `rate == 1.0`, in words per minute.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const MIN_WORDS_PER_MINUTE: f32 = 80.0;
const MAX_WORDS_PER_MINUTE: f32 = 450.0;

/// Where to find espeak-ng. `None` falls back to the system default.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

pub struct EspeakEngine {
    espeak: EspeakConfig,
    available: bool,
    cancel: Notify,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::with_config(EspeakConfig::default())
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    ///
    /// Use this when bundling espeak-ng with your application. Either path
    /// can be `None` to fall back to the system default.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self::with_config(EspeakConfig {
            bin_path,
            data_path,
        })
    }

    /// Probes the binary with `--version` once, here. Construct the engine
    /// before entering async code.
    pub fn with_config(espeak: EspeakConfig) -> Self {
        let available = probe(bin_path(&espeak));
        Self {
            espeak,
            available,
            cancel: Notify::new(),
        }
    }

    fn bin(&self) -> &Path {
        bin_path(&self.espeak)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.bin());
        if let Some(data) = &self.espeak.data_path {
            command.arg(format!("--path={}", data.display()));
        }
        command
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn speak(&self, text: &str, params: &SpeechParams) -> Result<(), SpeechError> {
        // Registered before spawning so a cancel issued meanwhile still counts.
        let cancelled = self.cancel.notified();
        let params = params.sanitized();
        let voice = params.voice.as_deref().unwrap_or(&params.language);

        let mut child = self
            .command()
            .args(["-v", voice])
            .args(["-s", &words_per_minute(params.rate).to_string()])
            .args(["-a", &amplitude(params.volume).to_string()])
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            // espeak-ng reads stdin line by line and can drop an unterminated last line.
            let payload = canonicalize_espeak_stdin_payload(text);
            stdin.write_all(payload.as_bytes()).await?;
        }

        tokio::select! {
            output = child.wait_with_output() => {
                let output = output?;
                if output.status.success() {
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(SpeechError::Failed(format!(
                        "espeak-ng exited with code {:?}: {stderr}",
                        output.status.code()
                    )))
                }
            }
            _ = cancelled => {
                log::debug!("Interrupted utterance {text:?}");
                Err(SpeechError::Interrupted)
            }
        }
    }

    fn cancel_all(&self) {
        self.cancel.notify_waiters();
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let output = self
            .command()
            .arg("--voices")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Failed(format!(
                "espeak-ng --voices exited with code {:?}: {stderr}",
                output.status.code()
            )));
        }

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn bin_path(espeak: &EspeakConfig) -> &Path {
    espeak
        .bin_path
        .as_deref()
        .unwrap_or_else(|| Path::new("espeak-ng"))
}

fn probe(bin: &Path) -> bool {
    let found = std::process::Command::new(bin)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if !found {
        log::warn!("espeak-ng not usable at {}", bin.display());
    }
    found
}

fn spawn_error(e: std::io::Error) -> SpeechError {
    if e.kind() == std::io::ErrorKind::NotFound {
        SpeechError::EspeakNotFound
    } else {
        SpeechError::Io(e)
    }
}

fn words_per_minute(rate: f32) -> u32 {
    (BASE_WORDS_PER_MINUTE * rate)
        .round()
        .clamp(MIN_WORDS_PER_MINUTE, MAX_WORDS_PER_MINUTE) as u32
}

fn amplitude(volume: f32) -> u32 {
    (volume * 100.0).round() as u32
}

fn canonicalize_espeak_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Parse the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
///
/// The language code doubles as the id, since `-v` accepts it directly.
fn parse_voice_list(table: &str) -> Vec<Voice> {
    table
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [_, language, _, name, ..] => Some(Voice {
                    id: (*language).to_string(),
                    name: name.replace('_', " "),
                    language: Some((*language).to_string()),
                }),
                _ => None,
            }
        })
        .collect()
}
