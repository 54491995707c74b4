use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::playback::segmenter::AutoPauseConfig;

/// Voice, rate and volume handed to the speech engine with every utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechParams {
    /// Preferred voice name. `None` or `"default"` picks by language.
    pub voice: Option<String>,
    /// Language prefix used when the preferred voice is missing (e.g. `"en"`).
    pub language: String,
    /// Speech rate multiplier. 1.0 is the engine's normal speed.
    pub rate: f32,
    /// Volume in `0.0..=1.0`.
    pub volume: f32,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            voice: None,
            language: "en".to_string(),
            rate: 1.0,
            volume: 1.0,
        }
    }
}

impl SpeechParams {
    /// Replace out-of-range values with the engine defaults.
    pub fn sanitized(&self) -> Self {
        let volume = if (0.0..=1.0).contains(&self.volume) {
            self.volume
        } else {
            1.0
        };
        let rate = if self.rate.is_finite() && self.rate > 0.0 {
            self.rate
        } else {
            1.0
        };
        let voice = self
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "default")
            .map(str::to_string);

        Self {
            voice,
            language: self.language.clone(),
            rate,
            volume,
        }
    }
}

/// Externally supplied playback settings. The crate never persists these.
///
/// ```
/// use tts_sequencer::{AutoPauseConfig, PauseLevel, PlaybackConfigBuilder};
///
/// let config = PlaybackConfigBuilder::default()
///     .auto_pause(AutoPauseConfig { enabled: true, level: PauseLevel::DoubleOnly, pause_seconds: 1.5 })
///     .repeat_count(2u32)
///     .build()
///     .unwrap();
/// assert!(!config.repeat_current);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct PlaybackConfig {
    pub auto_pause: AutoPauseConfig,
    /// Loop the current unit of sentence and section playback until stopped.
    pub repeat_current: bool,
    /// How many times each unit is spoken per visit.
    pub repeat_count: u32,
    pub speech: SpeechParams,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            auto_pause: AutoPauseConfig::default(),
            repeat_current: false,
            repeat_count: 1,
            speech: SpeechParams::default(),
        }
    }
}

impl PlaybackConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, PlaybackError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PlaybackError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.repeat_count == 0 {
            return Err(PlaybackError::Config(
                "repeat_count must be at least 1".to_string(),
            ));
        }
        let pause = self.auto_pause.pause_seconds;
        if pause.is_nan() || pause < 0.0 {
            return Err(PlaybackError::Config(format!(
                "auto_pause.pause_seconds must be >= 0, got {pause}"
            )));
        }
        Ok(())
    }

    /// `repeat_count` with 0 read as 1.
    pub fn effective_repeat_count(&self) -> u32 {
        self.repeat_count.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaybackConfig, PlaybackConfigBuilder, SpeechParams};
    use crate::error::PlaybackError;
    use crate::playback::segmenter::PauseLevel;
    use std::io::Write;

    #[test]
    fn sanitize_replaces_out_of_range_values() {
        let params = SpeechParams {
            voice: Some("default".to_string()),
            language: "en".to_string(),
            rate: 0.0,
            volume: 1.5,
        }
        .sanitized();
        assert_eq!(params.voice, None);
        assert_eq!(params.rate, 1.0);
        assert_eq!(params.volume, 1.0);

        let params = SpeechParams {
            voice: Some(" Zira ".to_string()),
            rate: 0.8,
            volume: 0.3,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.voice.as_deref(), Some("Zira"));
        assert_eq!(params.rate, 0.8);
        assert_eq!(params.volume, 0.3);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = PlaybackConfig::from_json_str(
            r#"{ "auto_pause": { "enabled": true, "level": 2, "pause_seconds": 1.5 },
                 "speech": { "rate": 0.9 } }"#,
        )
        .unwrap();
        assert!(config.auto_pause.enabled);
        assert_eq!(config.auto_pause.level, PauseLevel::DoubleOnly);
        assert_eq!(config.repeat_count, 1);
        assert_eq!(config.speech.rate, 0.9);
        assert_eq!(config.speech.language, "en");
    }

    #[test]
    fn rejects_zero_repeat_count_and_negative_pause() {
        assert!(matches!(
            PlaybackConfig::from_json_str(r#"{ "repeat_count": 0 }"#),
            Err(PlaybackError::Config(_))
        ));
        assert!(matches!(
            PlaybackConfig::from_json_str(r#"{ "auto_pause": { "pause_seconds": -1.0 } }"#),
            Err(PlaybackError::Config(_))
        ));
        assert!(matches!(
            PlaybackConfig::from_json_str("{ not json"),
            Err(PlaybackError::Json(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "repeat_current": true, "repeat_count": 3 }}"#).unwrap();
        let config = PlaybackConfig::load(file.path()).unwrap();
        assert!(config.repeat_current);
        assert_eq!(config.repeat_count, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PlaybackConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(PlaybackError::Io(_))));
    }

    #[test]
    fn builder_defaults_match_default() {
        let built = PlaybackConfigBuilder::default().build().unwrap();
        assert_eq!(built, PlaybackConfig::default());
    }
}
