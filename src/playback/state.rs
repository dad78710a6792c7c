//! Loop and session state with an explicit transition table
//!
//! A sentence-player session and a loop never run together: every transition that
//! enters one clears the other, so illegal combinations cannot be represented
//! after any call to [`PlaybackState::apply`].

use serde::Serialize;
use tracing::debug;

/// Which loop policy drives automatic seeks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    None,
    /// Repeat one sentence. `target` is `None` while armed but not yet acquired.
    Sentence { target: Option<usize> },
    /// Restart the track from zero when it ends.
    Article,
}

/// Whether playback is free-running or bound to a single sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionMode {
    #[default]
    Free,
    SentencePlayer { sentence: usize },
}

/// Named operations that change [`PlaybackState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ArmSentenceLoop { target: Option<usize> },
    AcquireLoopTarget(usize),
    ArmArticleLoop,
    DisarmLoop,
    StartSentencePlayer(usize),
    EndSentencePlayer,
    /// Discrete navigation or an external seek: drop loop and session.
    CancelAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackState {
    loop_mode: LoopMode,
    session: SessionMode,
}

impl PlaybackState {
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn session(&self) -> SessionMode {
        self.session
    }

    pub fn sentence_player(&self) -> Option<usize> {
        match self.session {
            SessionMode::SentencePlayer { sentence } => Some(sentence),
            SessionMode::Free => None,
        }
    }

    pub fn is_sentence_loop(&self) -> bool {
        matches!(self.loop_mode, LoopMode::Sentence { .. })
    }

    /// Apply a transition; returns `true` when the loop mode changed.
    pub fn apply(&mut self, transition: Transition) -> bool {
        let before = self.loop_mode;
        match transition {
            Transition::ArmSentenceLoop { target } => {
                self.loop_mode = LoopMode::Sentence { target };
                self.session = SessionMode::Free;
            }
            Transition::AcquireLoopTarget(index) => {
                if let LoopMode::Sentence { target } = &mut self.loop_mode {
                    *target = Some(index);
                }
            }
            Transition::ArmArticleLoop => {
                self.loop_mode = LoopMode::Article;
                self.session = SessionMode::Free;
            }
            Transition::DisarmLoop => self.loop_mode = LoopMode::None,
            Transition::StartSentencePlayer(sentence) => {
                self.loop_mode = LoopMode::None;
                self.session = SessionMode::SentencePlayer { sentence };
            }
            Transition::EndSentencePlayer => self.session = SessionMode::Free,
            Transition::CancelAll => {
                self.loop_mode = LoopMode::None;
                self.session = SessionMode::Free;
            }
        }
        debug!(?transition, loop_mode = ?self.loop_mode, session = ?self.session, "playback transition");
        before != self.loop_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_player_clears_any_loop() {
        let mut state = PlaybackState::default();
        state.apply(Transition::ArmArticleLoop);
        assert!(state.apply(Transition::StartSentencePlayer(3)));
        assert_eq!(state.loop_mode(), LoopMode::None);
        assert_eq!(state.sentence_player(), Some(3));
    }

    #[test]
    fn arming_a_loop_ends_the_session() {
        let mut state = PlaybackState::default();
        state.apply(Transition::StartSentencePlayer(1));
        state.apply(Transition::ArmSentenceLoop { target: Some(1) });
        assert_eq!(state.session(), SessionMode::Free);
        assert_eq!(state.loop_mode(), LoopMode::Sentence { target: Some(1) });
    }

    #[test]
    fn article_loop_replaces_sentence_loop() {
        let mut state = PlaybackState::default();
        state.apply(Transition::ArmSentenceLoop { target: Some(0) });
        state.apply(Transition::ArmArticleLoop);
        assert_eq!(state.loop_mode(), LoopMode::Article);
    }

    #[test]
    fn acquire_only_fills_armed_sentence_loop() {
        let mut state = PlaybackState::default();
        assert!(!state.apply(Transition::AcquireLoopTarget(2)));
        assert_eq!(state.loop_mode(), LoopMode::None);

        state.apply(Transition::ArmSentenceLoop { target: None });
        assert!(state.apply(Transition::AcquireLoopTarget(2)));
        assert_eq!(state.loop_mode(), LoopMode::Sentence { target: Some(2) });
    }

    #[test]
    fn cancel_all_returns_to_free_playback() {
        let mut state = PlaybackState::default();
        state.apply(Transition::StartSentencePlayer(0));
        state.apply(Transition::CancelAll);
        assert_eq!(state, PlaybackState::default());
    }
}
