//! Sentence player - "play exactly this sentence once" sessions

use tracing::{debug, info};

use crate::config::PlayerConfig;
use crate::playback::state::{PlaybackState, Transition};
use crate::timeline::TimelineIndex;
use crate::types::Sentence;

/// What a sentence toggle asks of the media element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SentenceToggle {
    Resume,
    Pause,
    /// A new session started; seek here and play.
    Restart { seek_to: f64 },
}

/// A session ended at its boundary; pause and park the playhead at `rewind_to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionFinished {
    pub sentence: usize,
    pub rewind_to: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SentencePlayer {
    lead_in: f64,
    toggle_lead_in: f64,
    end_epsilon: f64,
}

impl SentencePlayer {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            lead_in: config.player_lead_in,
            toggle_lead_in: config.toggle_lead_in,
            end_epsilon: config.player_end_epsilon,
        }
    }

    /// Start a new session on `sentence`, replacing any previous one. Returns the seek position.
    pub fn play_from_start(&self, state: &mut PlaybackState, sentence: &Sentence) -> f64 {
        if let Some(previous) = state.sentence_player() {
            debug!(previous, "replacing sentence session");
        }
        state.apply(Transition::StartSentencePlayer(sentence.index));
        let seek_to = (sentence.start - self.lead_in).max(0.0);
        info!(sentence = sentence.index, seek_to, "sentence session started");
        seek_to
    }

    /// Play/pause when `sentence` is the active session, or when no session runs and the
    /// playhead already sits inside it; otherwise start over from its beginning.
    pub fn toggle(
        &self,
        state: &mut PlaybackState,
        sentence: &Sentence,
        t: f64,
        paused: bool,
    ) -> SentenceToggle {
        let owns_session = match state.sentence_player() {
            Some(active) => active == sentence.index,
            None => sentence.contains(t, self.toggle_lead_in),
        };
        if !owns_session {
            return SentenceToggle::Restart {
                seek_to: self.play_from_start(state, sentence),
            };
        }
        if paused {
            SentenceToggle::Resume
        } else {
            SentenceToggle::Pause
        }
    }

    /// End the session once the playhead reaches the sentence end.
    pub fn on_time_sample(
        &self,
        state: &mut PlaybackState,
        timeline: &TimelineIndex,
        t: f64,
    ) -> Option<SessionFinished> {
        let index = state.sentence_player()?;
        let Some(sentence) = timeline.sentence(index) else {
            state.apply(Transition::EndSentencePlayer);
            return None;
        };
        let end = sentence.end?;
        if t < end - self.end_epsilon {
            return None;
        }
        state.apply(Transition::EndSentencePlayer);
        info!(sentence = index, time = t, "sentence session reached its end");
        Some(SessionFinished {
            sentence: index,
            rewind_to: sentence.start,
        })
    }
}
