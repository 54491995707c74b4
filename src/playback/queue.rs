use std::fmt;

use serde::{Deserialize, Serialize};

/// One character's turn in a scene, split into sentences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Stable across re-parses of unchanged input.
    pub id: u64,
    pub speaker: String,
    pub sentences: Vec<String>,
}

/// A numbered scene of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    pub lines: Vec<Line>,
}

/// A section of plain book text, read sentence by sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub sentences: Vec<String>,
}

/// Which UI affordance a playback chain was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackScope {
    Scene,
    Line,
    Sentence,
    Section,
}

impl PlaybackScope {
    /// Whether `repeat_current` applies to chains of this scope.
    ///
    /// Scene and line playback always run straight through to the end.
    pub fn allows_repeat(self) -> bool {
        matches!(self, PlaybackScope::Sentence | PlaybackScope::Section)
    }
}

/// Stable address of a unit: the line (or section) id and the sentence index
/// within it. Renders as `"<source>-<index>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub source: u64,
    pub index: usize,
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.index)
    }
}

/// One speakable unit of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackUnit {
    pub key: UnitKey,
    pub text: String,
}

impl PlaybackUnit {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Content to flatten into a queue.
#[derive(Debug, Clone, Copy)]
pub enum QueueSource<'a> {
    Scene(&'a Scene),
    Line(&'a Line),
    Sentence { line: &'a Line, index: usize },
    Section(&'a Section),
}

impl QueueSource<'_> {
    pub fn scope(&self) -> PlaybackScope {
        match self {
            QueueSource::Scene(_) => PlaybackScope::Scene,
            QueueSource::Line(_) => PlaybackScope::Line,
            QueueSource::Sentence { .. } => PlaybackScope::Sentence,
            QueueSource::Section(_) => PlaybackScope::Section,
        }
    }
}

/// The ordered units of one playback chain. Never changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackQueue {
    scope: PlaybackScope,
    units: Vec<PlaybackUnit>,
}

impl PlaybackQueue {
    /// Flatten `source` into units in document order.
    ///
    /// Scene queues prefix the first sentence of every line with the
    /// speaker's name. A sentence index outside its line gives an empty
    /// queue.
    pub fn build(source: QueueSource<'_>) -> Self {
        let units = match source {
            QueueSource::Scene(scene) => scene
                .lines
                .iter()
                .flat_map(|line| {
                    line.sentences.iter().enumerate().map(|(index, sentence)| {
                        let text = if index == 0 {
                            format!("{}: {}", line.speaker, sentence)
                        } else {
                            sentence.clone()
                        };
                        unit(line.id, index, text)
                    })
                })
                .collect(),
            QueueSource::Line(line) => sentences(line.id, &line.sentences),
            QueueSource::Sentence { line, index } => line
                .sentences
                .get(index)
                .map(|sentence| vec![unit(line.id, index, sentence.clone())])
                .unwrap_or_default(),
            QueueSource::Section(section) => sentences(section.id, &section.sentences),
        };

        Self {
            scope: source.scope(),
            units,
        }
    }

    pub fn scene(scene: &Scene) -> Self {
        Self::build(QueueSource::Scene(scene))
    }

    pub fn line(line: &Line) -> Self {
        Self::build(QueueSource::Line(line))
    }

    pub fn sentence(line: &Line, index: usize) -> Self {
        Self::build(QueueSource::Sentence { line, index })
    }

    pub fn section(section: &Section) -> Self {
        Self::build(QueueSource::Section(section))
    }

    pub fn scope(&self) -> PlaybackScope {
        self.scope
    }

    pub fn get(&self, index: usize) -> Option<&PlaybackUnit> {
        self.units.get(index)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[PlaybackUnit] {
        &self.units
    }
}

fn sentences(source: u64, sentences: &[String]) -> Vec<PlaybackUnit> {
    sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| unit(source, index, sentence.clone()))
        .collect()
}

fn unit(source: u64, index: usize, text: String) -> PlaybackUnit {
    PlaybackUnit {
        key: UnitKey { source, index },
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::{Line, PlaybackQueue, PlaybackScope, Scene, Section};

    fn line(id: u64, speaker: &str, sentences: &[&str]) -> Line {
        Line {
            id,
            speaker: speaker.to_string(),
            sentences: sentences.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn scene() -> Scene {
        Scene {
            id: 1,
            number: 1,
            title: "Morning".to_string(),
            lines: vec![
                line(7, "Anna", &["Good morning.", "Did you sleep well?"]),
                line(8, "Ben", &["Yes."]),
            ],
        }
    }

    fn texts(queue: &PlaybackQueue) -> Vec<&str> {
        queue.units().iter().map(|u| u.text.as_str()).collect()
    }

    fn keys(queue: &PlaybackQueue) -> Vec<String> {
        queue.units().iter().map(|u| u.key.to_string()).collect()
    }

    #[test]
    fn scene_prefixes_first_sentence_of_each_line() {
        let queue = PlaybackQueue::scene(&scene());
        assert_eq!(queue.scope(), PlaybackScope::Scene);
        assert_eq!(
            texts(&queue),
            vec!["Anna: Good morning.", "Did you sleep well?", "Ben: Yes."]
        );
        assert_eq!(keys(&queue), vec!["7-0", "7-1", "8-0"]);
    }

    #[test]
    fn line_scope_is_unprefixed() {
        let scene = scene();
        let queue = PlaybackQueue::line(&scene.lines[0]);
        assert_eq!(queue.scope(), PlaybackScope::Line);
        assert_eq!(texts(&queue), vec!["Good morning.", "Did you sleep well?"]);
        assert_eq!(keys(&queue), vec!["7-0", "7-1"]);
    }

    #[test]
    fn sentence_scope_has_exactly_one_unit() {
        let scene = scene();
        let queue = PlaybackQueue::sentence(&scene.lines[0], 1);
        assert_eq!(queue.scope(), PlaybackScope::Sentence);
        assert_eq!(texts(&queue), vec!["Did you sleep well?"]);
        assert_eq!(keys(&queue), vec!["7-1"]);
    }

    #[test]
    fn sentence_out_of_range_is_empty() {
        let scene = scene();
        assert!(PlaybackQueue::sentence(&scene.lines[1], 3).is_empty());
    }

    #[test]
    fn section_keys_use_section_id() {
        let section = Section {
            id: 3,
            title: "Section 3".to_string(),
            sentences: vec!["One.".to_string(), String::new(), "Two.".to_string()],
        };
        let queue = PlaybackQueue::section(&section);
        assert_eq!(keys(&queue), vec!["3-0", "3-1", "3-2"]);
        assert!(queue.get(1).unwrap().is_blank());
    }

    #[test]
    fn rebuilding_gives_identical_keys() {
        assert_eq!(PlaybackQueue::scene(&scene()), PlaybackQueue::scene(&scene()));
    }

    #[test]
    fn only_sentence_and_section_allow_repeat() {
        assert!(!PlaybackScope::Scene.allows_repeat());
        assert!(!PlaybackScope::Line.allows_repeat());
        assert!(PlaybackScope::Sentence.allows_repeat());
        assert!(PlaybackScope::Section.allows_repeat());
    }
}
