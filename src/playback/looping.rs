//! Loop controller - decides when a loop forces the playhead back

use tracing::{debug, info};

use crate::config::PlayerConfig;
use crate::playback::state::{LoopMode, PlaybackState, Transition};
use crate::timeline::TimelineIndex;
use crate::types::Sentence;

/// Outcome of toggling the sentence loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceLoopToggle {
    /// Loop armed; `target` is `None` when no sentence claims the current time yet.
    Armed { target: Option<usize> },
    Disarmed,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopController {
    end_padding: f64,
    start_padding: f64,
}

impl LoopController {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            end_padding: config.loop_end_padding,
            start_padding: config.loop_start_padding,
        }
    }

    pub fn toggle_sentence_loop(
        &self,
        state: &mut PlaybackState,
        timeline: &TimelineIndex,
        t: f64,
    ) -> SentenceLoopToggle {
        if state.is_sentence_loop() {
            state.apply(Transition::DisarmLoop);
            info!("sentence loop disarmed");
            return SentenceLoopToggle::Disarmed;
        }
        let target = timeline.sentence_index_at(t);
        state.apply(Transition::ArmSentenceLoop { target });
        info!(?target, time = t, "sentence loop armed");
        SentenceLoopToggle::Armed { target }
    }

    /// Returns `true` when the article loop is now active.
    pub fn toggle_article_loop(&self, state: &mut PlaybackState) -> bool {
        if state.loop_mode() == LoopMode::Article {
            state.apply(Transition::DisarmLoop);
            info!("article loop disarmed");
            false
        } else {
            state.apply(Transition::ArmArticleLoop);
            info!("article loop armed");
            true
        }
    }

    /// Inspect a time sample; returns the rewind position when the loop boundary is hit.
    pub fn on_time_sample(
        &self,
        state: &mut PlaybackState,
        timeline: &TimelineIndex,
        t: f64,
    ) -> Option<f64> {
        let sentence = self.current_target(state, timeline, t)?;
        let end = sentence.end?;
        let rewind = self.rewind_point(sentence);
        // Sentences shorter than the padding play through to their end
        let trigger = if end - self.end_padding > rewind {
            end - self.end_padding
        } else {
            end
        };
        if t >= trigger {
            debug!(
                sentence = sentence.index,
                time = t,
                end,
                rewind,
                "sentence loop boundary reached"
            );
            return Some(rewind);
        }
        None
    }

    /// Where to restart when the media reports it has ended, if any loop applies.
    ///
    /// The last sentence has no successor to bound it, so `ended` is its only boundary.
    pub fn on_ended(
        &self,
        state: &mut PlaybackState,
        timeline: &TimelineIndex,
        t: f64,
    ) -> Option<f64> {
        match state.loop_mode() {
            LoopMode::Sentence { .. } => {
                let sentence = self.current_target(state, timeline, t)?;
                info!(sentence = sentence.index, "track ended inside sentence loop");
                Some(sentence.start)
            }
            LoopMode::Article => {
                info!("track ended; article loop restarts from zero");
                Some(0.0)
            }
            LoopMode::None => None,
        }
    }

    pub fn rewind_point(&self, sentence: &Sentence) -> f64 {
        (sentence.start - self.start_padding).max(0.0)
    }

    /// The loop target, re-acquired from `t` when it is missing or stale.
    fn current_target<'a>(
        &self,
        state: &mut PlaybackState,
        timeline: &'a TimelineIndex,
        t: f64,
    ) -> Option<&'a Sentence> {
        let LoopMode::Sentence { target } = state.loop_mode() else {
            return None;
        };
        if let Some(sentence) = target.and_then(|index| timeline.sentence(index)) {
            return Some(sentence);
        }
        let acquired = timeline.sentence_at(t)?;
        state.apply(Transition::AcquireLoopTarget(acquired.index));
        info!(
            sentence = acquired.index,
            stale = ?target,
            time = t,
            "sentence loop target re-acquired"
        );
        Some(acquired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sentence;

    fn timeline() -> TimelineIndex {
        let sentences = [(0.0, Some(5.0)), (5.0, Some(10.0)), (10.0, None)]
            .iter()
            .enumerate()
            .map(|(index, &(start, end))| Sentence {
                index,
                start,
                end,
                text: String::new(),
                translation: None,
                words: Vec::new(),
            })
            .collect();
        TimelineIndex::new(sentences, 0.1, 1.5)
    }

    fn controller() -> LoopController {
        LoopController::new(&PlayerConfig::default())
    }

    #[test]
    fn rewinds_inside_end_padding() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        let loops = controller();
        assert_eq!(
            loops.toggle_sentence_loop(&mut state, &timeline, 6.0),
            SentenceLoopToggle::Armed { target: Some(1) }
        );
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 9.8), None);
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 9.86), Some(5.0));
    }

    #[test]
    fn sentence_shorter_than_padding_still_plays() {
        let timeline = TimelineIndex::new(
            [(0.0, Some(5.0)), (5.0, Some(5.1)), (5.1, None)]
                .iter()
                .enumerate()
                .map(|(index, &(start, end))| Sentence {
                    index,
                    start,
                    end,
                    text: String::new(),
                    translation: None,
                    words: Vec::new(),
                })
                .collect(),
            0.1,
            1.5,
        );
        let mut state = PlaybackState::default();
        state.apply(Transition::ArmSentenceLoop { target: Some(1) });
        let loops = controller();
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 5.0), None);
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 5.05), None);
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 5.1), Some(5.0));
    }

    #[test]
    fn start_padding_is_clamped_at_zero() {
        let config = PlayerConfig {
            loop_start_padding: 0.3,
            ..PlayerConfig::default()
        };
        let loops = LoopController::new(&config);
        let timeline = timeline();
        assert_eq!(loops.rewind_point(timeline.sentence(0).unwrap()), 0.0);
        assert!((loops.rewind_point(timeline.sentence(1).unwrap()) - 4.7).abs() < 1e-9);
    }

    #[test]
    fn unresolved_last_sentence_never_rewinds_on_samples() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        let loops = controller();
        loops.toggle_sentence_loop(&mut state, &timeline, 11.0);
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 1000.0), None);
        assert_eq!(loops.on_ended(&mut state, &timeline, 1000.0), Some(10.0));
    }

    #[test]
    fn armed_without_target_reacquires_on_next_valid_sample() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        let loops = controller();
        assert_eq!(
            loops.toggle_sentence_loop(&mut state, &timeline, -3.0),
            SentenceLoopToggle::Armed { target: None }
        );
        assert_eq!(loops.on_time_sample(&mut state, &timeline, -2.0), None);
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 1.0), None);
        assert_eq!(state.loop_mode(), LoopMode::Sentence { target: Some(0) });
    }

    #[test]
    fn stale_target_is_replaced() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        state.apply(Transition::ArmSentenceLoop { target: Some(42) });
        let loops = controller();
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 7.0), None);
        assert_eq!(state.loop_mode(), LoopMode::Sentence { target: Some(1) });
    }

    #[test]
    fn toggling_twice_disarms_without_seeking() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        let loops = controller();
        loops.toggle_sentence_loop(&mut state, &timeline, 1.0);
        assert_eq!(
            loops.toggle_sentence_loop(&mut state, &timeline, 1.0),
            SentenceLoopToggle::Disarmed
        );
        assert_eq!(state.loop_mode(), LoopMode::None);
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 4.99), None);
    }

    #[test]
    fn article_loop_restarts_only_on_end() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        let loops = controller();
        assert!(loops.toggle_article_loop(&mut state));
        assert_eq!(loops.on_time_sample(&mut state, &timeline, 9.99), None);
        assert_eq!(loops.on_ended(&mut state, &timeline, 12.0), Some(0.0));
        assert!(!loops.toggle_article_loop(&mut state));
        assert_eq!(loops.on_ended(&mut state, &timeline, 12.0), None);
    }
}
