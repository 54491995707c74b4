use serde::Serialize;

use super::{Effect, Ticket, Utterance};
use crate::config::SpeechParams;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordLoopState {
    pub active: bool,
    pub word: String,
}

/// Continuation of a word loop: re-arms only for the loop that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTicket {
    generation: u64,
    word: String,
}

/// Repeats one word until released, one utterance in flight at a time.
///
/// Stopping never interrupts the utterance in flight; the loop just does not
/// re-arm when it completes. A word started while an earlier utterance is
/// still out gets a `CancelSpeech` and speaks once that utterance resolves.
#[derive(Debug, Default)]
pub struct WordLoop {
    state: Option<WordLoopState>,
    generation: u64,
    /// Generation stamped on the utterance currently out, if any.
    in_flight: Option<u64>,
}

impl WordLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&WordLoopState> {
        self.state.as_ref()
    }

    /// The word being drilled, if the loop is active.
    pub fn active_word(&self) -> Option<&str> {
        self.state
            .as_ref()
            .filter(|state| state.active)
            .map(|state| state.word.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.active_word().is_some()
    }

    /// Start drilling `word`. Re-pressing the active word is a no-op.
    pub fn start(&mut self, word: &str, params: &SpeechParams) -> Vec<Effect> {
        let word = word.trim();
        if word.is_empty() || self.active_word() == Some(word) {
            return Vec::new();
        }

        self.generation += 1;
        log::debug!("Starting word loop for {word:?}");
        self.state = Some(WordLoopState {
            active: true,
            word: word.to_string(),
        });
        if self.in_flight.is_some() {
            log::trace!("Holding {word:?} until the previous utterance resolves");
            return vec![Effect::CancelSpeech];
        }
        vec![self.speak(params)]
    }

    pub fn stop(&mut self) {
        if let Some(state) = self.state.as_mut() {
            if state.active {
                log::debug!("Stopping word loop for {:?}", state.word);
            }
            state.active = false;
        }
    }

    /// The utterance in flight ended (either way): speak the active word
    /// next, if any.
    pub fn resume(&mut self, ticket: &WordTicket, params: &SpeechParams) -> Vec<Effect> {
        if self.in_flight != Some(ticket.generation) {
            log::trace!("Ignoring unknown word completion for {:?}", ticket.word);
            return Vec::new();
        }
        self.in_flight = None;
        if !self.is_active() {
            log::trace!("Word loop for {:?} ended", ticket.word);
            return Vec::new();
        }
        vec![self.speak(params)]
    }

    fn speak(&mut self, params: &SpeechParams) -> Effect {
        let word = self
            .state
            .as_ref()
            .map(|state| state.word.clone())
            .unwrap_or_default();
        self.in_flight = Some(self.generation);
        Effect::Speak(Utterance {
            text: word.clone(),
            params: params.clone(),
            ticket: Ticket::Word(WordTicket {
                generation: self.generation,
                word,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{WordLoop, WordTicket};
    use crate::config::SpeechParams;
    use crate::playback::{Effect, Ticket};

    fn ticket(effects: &[Effect]) -> WordTicket {
        match effects {
            [Effect::Speak(u)] => match &u.ticket {
                Ticket::Word(t) => t.clone(),
                other => panic!("unexpected ticket {other:?}"),
            },
            other => panic!("expected a single speak, got {other:?}"),
        }
    }

    fn spoken(effects: &[Effect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Speak(u) => Some(u.text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn repeats_until_stopped() {
        let params = SpeechParams::default();
        let mut words = WordLoop::new();
        let mut effects = words.start("  apple ", &params);
        assert_eq!(spoken(&effects), vec!["apple"]);

        for _ in 0..3 {
            effects = words.resume(&ticket(&effects), &params);
            assert_eq!(spoken(&effects), vec!["apple"]);
        }

        let last = ticket(&effects);
        words.stop();
        assert!(!words.is_active());
        assert_eq!(words.state().map(|s| s.word.as_str()), Some("apple"));
        assert!(words.resume(&last, &params).is_empty());
    }

    #[test]
    fn repress_of_same_word_is_idempotent() {
        let params = SpeechParams::default();
        let mut words = WordLoop::new();
        assert_eq!(words.start("apple", &params).len(), 1);
        assert!(words.start("apple", &params).is_empty());
    }

    #[test]
    fn new_word_waits_for_the_old_utterance() {
        let params = SpeechParams::default();
        let mut words = WordLoop::new();
        let apple = ticket(&words.start("apple", &params));
        assert_eq!(words.start("pear", &params), vec![Effect::CancelSpeech]);
        assert_eq!(words.active_word(), Some("pear"));

        let pear = words.resume(&apple, &params);
        assert_eq!(spoken(&pear), vec!["pear"]);
        assert!(words.resume(&apple, &params).is_empty());
        assert_eq!(spoken(&words.resume(&ticket(&pear), &params)), vec!["pear"]);
    }

    #[test]
    fn release_then_press_keeps_one_utterance_in_flight() {
        let params = SpeechParams::default();
        let mut words = WordLoop::new();
        let first = ticket(&words.start("apple", &params));
        words.stop();
        assert_eq!(words.start("apple", &params), vec![Effect::CancelSpeech]);

        let second = words.resume(&first, &params);
        assert_eq!(spoken(&second), vec!["apple"]);
        assert!(words.resume(&first, &params).is_empty());
        assert_eq!(spoken(&words.resume(&ticket(&second), &params)), vec!["apple"]);
    }

    #[test]
    fn press_after_the_old_utterance_resolved_speaks_at_once() {
        let params = SpeechParams::default();
        let mut words = WordLoop::new();
        let apple = ticket(&words.start("apple", &params));
        words.stop();
        assert!(words.resume(&apple, &params).is_empty());
        assert_eq!(spoken(&words.start("pear", &params)), vec!["pear"]);
    }

    #[test]
    fn blank_word_is_ignored() {
        let params = SpeechParams::default();
        let mut words = WordLoop::new();
        assert!(words.start("   ", &params).is_empty());
        assert!(words.state().is_none());
    }
}
