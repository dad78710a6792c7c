//! Highlight projector - turns a playback time into highlight deltas
//!
//! The projector caches the active sentence and word and emits activate/deactivate
//! pairs only when the resolved identity changes, so projecting the same time twice
//! is a no-op.

use crate::playback::events::{EventSink, PlayerEvent};
use crate::timeline::TimelineIndex;
use crate::types::WordRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightState {
    pub sentence: Option<usize>,
    pub word: Option<WordRef>,
}

#[derive(Debug, Clone, Default)]
pub struct HighlightProjector {
    state: HighlightState,
}

impl HighlightProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HighlightState {
        self.state
    }

    /// Resolve `t` and emit the deltas.
    ///
    /// A sentence change also requests a scroll unless `suppress_scroll` is set, which
    /// the player does while a sentence session is active.
    pub fn project(
        &mut self,
        timeline: &TimelineIndex,
        t: f64,
        suppress_scroll: bool,
        sink: &mut impl EventSink,
    ) -> HighlightState {
        let sentence = timeline.sentence_index_at(t);
        if sentence != self.state.sentence {
            self.swap_sentence(sentence, sink);
            if let (Some(index), false) = (sentence, suppress_scroll) {
                sink.emit(PlayerEvent::ScrollToSentence(index));
            }
        }
        self.project_word(timeline.word_at(t), sink);
        self.state
    }

    /// Force `index` active, e.g. when the user picks a sentence directly. Always scrolls.
    pub fn activate_sentence(&mut self, index: usize, sink: &mut impl EventSink) {
        if self.state.sentence != Some(index) {
            self.swap_sentence(Some(index), sink);
        }
        sink.emit(PlayerEvent::ScrollToSentence(index));
    }

    /// Deactivate everything, emitting the matching events.
    pub fn clear(&mut self, sink: &mut impl EventSink) {
        self.project_word(None, sink);
        self.swap_sentence(None, sink);
    }

    /// Forget cached identities without emitting anything.
    pub fn forget(&mut self) {
        self.state = HighlightState::default();
    }

    fn project_word(&mut self, word: Option<WordRef>, sink: &mut impl EventSink) {
        if word == self.state.word {
            return;
        }
        if let Some(previous) = self.state.word.take() {
            sink.emit(PlayerEvent::WordDeactivated(previous));
        }
        if let Some(next) = word {
            sink.emit(PlayerEvent::WordActivated(next));
        }
        self.state.word = word;
    }

    fn swap_sentence(&mut self, sentence: Option<usize>, sink: &mut impl EventSink) {
        if let Some(previous) = self.state.sentence.take() {
            sink.emit(PlayerEvent::SentenceDeactivated(previous));
        }
        if let Some(next) = sentence {
            sink.emit(PlayerEvent::SentenceActivated(next));
        }
        self.state.sentence = sentence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sentence, Word};

    fn timeline() -> TimelineIndex {
        let words = |start: f64| {
            vec![
                Word {
                    text: "a".into(),
                    start,
                    end: start + 1.0,
                },
                Word {
                    text: "b".into(),
                    start: start + 1.2,
                    end: start + 2.0,
                },
            ]
        };
        TimelineIndex::new(
            vec![
                Sentence {
                    index: 0,
                    start: 0.0,
                    end: Some(5.0),
                    text: "a b".into(),
                    translation: None,
                    words: words(0.0),
                },
                Sentence {
                    index: 1,
                    start: 5.0,
                    end: None,
                    text: "a b".into(),
                    translation: None,
                    words: words(5.0),
                },
            ],
            0.1,
            1.5,
        )
    }

    #[test]
    fn projecting_same_time_twice_emits_nothing_new() {
        let timeline = timeline();
        let mut projector = HighlightProjector::new();
        let mut events = Vec::new();
        projector.project(&timeline, 0.5, false, &mut events);
        let first = events.len();
        projector.project(&timeline, 0.5, false, &mut events);
        assert_eq!(events.len(), first);
        assert_eq!(
            events,
            vec![
                PlayerEvent::SentenceActivated(0),
                PlayerEvent::ScrollToSentence(0),
                PlayerEvent::WordActivated(WordRef {
                    sentence: 0,
                    word: 0
                }),
            ]
        );
    }

    #[test]
    fn sentence_change_swaps_exactly_one_active() {
        let timeline = timeline();
        let mut projector = HighlightProjector::new();
        let mut events = Vec::new();
        projector.project(&timeline, 0.5, false, &mut events);
        events.clear();
        projector.project(&timeline, 5.5, false, &mut events);
        assert_eq!(
            events,
            vec![
                PlayerEvent::SentenceDeactivated(0),
                PlayerEvent::SentenceActivated(1),
                PlayerEvent::ScrollToSentence(1),
                PlayerEvent::WordDeactivated(WordRef {
                    sentence: 0,
                    word: 0
                }),
                PlayerEvent::WordActivated(WordRef {
                    sentence: 1,
                    word: 0
                }),
            ]
        );
    }

    #[test]
    fn scroll_is_suppressed_on_request() {
        let timeline = timeline();
        let mut projector = HighlightProjector::new();
        let mut events = Vec::new();
        projector.project(&timeline, 5.5, true, &mut events);
        assert!(!events
            .iter()
            .any(|event| matches!(event, PlayerEvent::ScrollToSentence(_))));
    }

    #[test]
    fn word_goes_dark_in_long_silence() {
        let timeline = timeline();
        let mut projector = HighlightProjector::new();
        let mut events = Vec::new();
        projector.project(&timeline, 1.5, false, &mut events);
        events.clear();
        let state = projector.project(&timeline, 3.8, false, &mut events);
        assert_eq!(state.word, None);
        assert_eq!(state.sentence, Some(0));
        assert_eq!(
            events,
            vec![PlayerEvent::WordDeactivated(WordRef {
                sentence: 0,
                word: 1
            })]
        );
    }

    #[test]
    fn time_before_first_sentence_clears_highlight() {
        let timeline = timeline();
        let mut projector = HighlightProjector::new();
        let mut events = Vec::new();
        projector.project(&timeline, 0.5, false, &mut events);
        events.clear();
        let state = projector.project(&timeline, -1.0, false, &mut events);
        assert_eq!(state, HighlightState::default());
        assert!(events.contains(&PlayerEvent::SentenceDeactivated(0)));
    }
}
