use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Any run of `/` markers together with the whitespace around it.
static MARKER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/+\s*").unwrap());

/// A `//` pause marker together with the whitespace around it.
static DOUBLE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*//\s*").unwrap());

/// Which markers turn into pauses when auto-pause is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PauseLevel {
    /// Both `/` and `//` are pause points.
    #[default]
    Every,
    /// Only `//` is a pause point; `/` is read as a space.
    DoubleOnly,
}

impl TryFrom<u8> for PauseLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(PauseLevel::Every),
            2 => Ok(PauseLevel::DoubleOnly),
            other => Err(format!("auto-pause level must be 1 or 2, got {other}")),
        }
    }
}

impl From<PauseLevel> for u8 {
    fn from(level: PauseLevel) -> Self {
        match level {
            PauseLevel::Every => 1,
            PauseLevel::DoubleOnly => 2,
        }
    }
}

/// Auto-pause settings, read once per unit when it starts speaking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPauseConfig {
    pub enabled: bool,
    pub level: PauseLevel,
    /// Silence inserted between segments, in seconds.
    pub pause_seconds: f32,
}

impl Default for AutoPauseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: PauseLevel::Every,
            pause_seconds: 0.0,
        }
    }
}

impl AutoPauseConfig {
    /// True when markers should produce gaps at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.pause_seconds > 0.0
    }

    /// The gap between segments. Zero for negative, NaN or infinite input.
    pub fn pause(&self) -> Duration {
        if !self.is_active() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f32(self.pause_seconds).unwrap_or(Duration::ZERO)
    }
}

/// One speakable piece of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    /// A pause follows this segment before the next one is spoken.
    pub gap_after: bool,
}

/// Split `text` into segments at its pause markers.
///
/// With auto-pause off, every marker run collapses to a single space and the
/// whole text is one segment. With it on, [`PauseLevel`] decides which
/// markers split the text. Every segment except the last has `gap_after`
/// set.
pub fn segment(text: &str, cfg: &AutoPauseConfig) -> Vec<Segment> {
    if !cfg.is_active() {
        return vec![unsegmented(text)];
    }

    let pieces: Vec<String> = split_pause_points(text, cfg.level)
        .into_iter()
        .map(|piece| collapse_markers(&piece))
        .filter(|piece| !piece.is_empty())
        .collect();

    if pieces.is_empty() {
        return vec![unsegmented(text)];
    }

    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| Segment {
            text,
            gap_after: i < last,
        })
        .collect()
}

fn split_pause_points(text: &str, level: PauseLevel) -> Vec<String> {
    match level {
        // `//` is itself a marker run, so one pass over all runs covers both.
        PauseLevel::Every => MARKER_RUN.split(text).map(str::to_string).collect(),
        PauseLevel::DoubleOnly => DOUBLE_MARKER
            .split(text)
            .map(|piece| MARKER_RUN.replace_all(piece, " ").into_owned())
            .collect(),
    }
}

fn collapse_markers(text: &str) -> String {
    MARKER_RUN.replace_all(text, " ").trim().to_string()
}

fn unsegmented(text: &str) -> Segment {
    Segment {
        text: collapse_markers(text),
        gap_after: false,
    }
}
