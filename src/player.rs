//! Player session context
//!
//! One [`Player`] owns every piece of per-article state: the timeline, highlight cache,
//! loop/session state, seek arbitration and cloze masks. Media notifications and user
//! commands are routed through it so each component sees a consistent view. Loading a
//! new article discards all of it before the new transcript is indexed.

use tracing::{debug, info, warn};

use crate::cloze::{ClozeGenerator, ClozeMask};
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::highlight::{HighlightProjector, HighlightState};
use crate::playback::{
    EventSink, LoopController, LoopMode, MediaEvent, MediaSource, PlaybackState, PlayerEvent,
    SeekArbiter, SeekOrigin, SentenceLoopToggle, SentencePlayer, SentenceToggle, Transition,
    VirtualMedia,
};
use crate::timeline::TimelineIndex;
use crate::types::{DisplayMode, TranscriptDocument};

/// Upper bound on notification rounds drained per tick; a seek issued while handling
/// one round completes in the next.
const MAX_SETTLE_ROUNDS: usize = 8;

pub struct Player<M: MediaSource> {
    config: PlayerConfig,
    media: M,
    title: String,
    timeline: TimelineIndex,
    projector: HighlightProjector,
    state: PlaybackState,
    loops: LoopController,
    sentence_player: SentencePlayer,
    seek: SeekArbiter,
    cloze: ClozeGenerator,
    masks: Vec<ClozeMask>,
    display_mode: DisplayMode,
    transcript_ready: bool,
    audio_ready: bool,
}

impl<M: MediaSource> Player<M> {
    pub fn new(config: PlayerConfig, media: M) -> Self {
        let cloze = match config.cloze_seed {
            Some(seed) => ClozeGenerator::seeded(config.cloze.clone(), seed),
            None => ClozeGenerator::from_os_rng(config.cloze.clone()),
        };
        Self {
            loops: LoopController::new(&config),
            sentence_player: SentencePlayer::new(&config),
            timeline: TimelineIndex::new(Vec::new(), config.sentence_lead_in, config.word_gap_fill),
            config,
            media,
            title: String::new(),
            projector: HighlightProjector::new(),
            state: PlaybackState::default(),
            seek: SeekArbiter::default(),
            cloze,
            masks: Vec::new(),
            display_mode: DisplayMode::default(),
            transcript_ready: false,
            audio_ready: false,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn timeline(&self) -> &TimelineIndex {
        &self.timeline
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.state.loop_mode()
    }

    pub fn highlight(&self) -> HighlightState {
        self.projector.state()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn cloze_masks(&self) -> &[ClozeMask] {
        &self.masks
    }

    pub fn is_dragging(&self) -> bool {
        self.seek.is_dragging()
    }

    /// Both the transcript and the media metadata have arrived.
    pub fn is_ready(&self) -> bool {
        self.transcript_ready && self.audio_ready
    }

    /// Drop everything derived from the previous transcript and index `document`.
    ///
    /// Audio readiness is left alone: metadata may already have arrived for this article.
    /// Call [`Player::reset`] first when switching to a different article.
    pub fn load(&mut self, document: &TranscriptDocument, sink: &mut impl EventSink) {
        self.clear_transcript_state(sink);
        self.title = document.title.clone();
        self.timeline = TimelineIndex::new(
            document.to_sentences(),
            self.config.sentence_lead_in,
            self.config.word_gap_fill,
        );
        self.transcript_ready = true;
        info!(
            title = %self.title,
            sentences = self.timeline.len(),
            words = self.timeline.word_count(),
            "transcript loaded"
        );
        self.resolve_last_end();
        if self.display_mode == DisplayMode::Cloze {
            self.regenerate_cloze(sink);
        }
    }

    /// Pause, rewind and forget every piece of per-article state, audio readiness included.
    pub fn reset(&mut self, sink: &mut impl EventSink) {
        self.media.pause();
        self.seek.reset();
        self.seek_media(SeekOrigin::Player, 0.0);
        self.clear_transcript_state(sink);
        self.audio_ready = false;
        info!("player reset");
    }

    fn clear_transcript_state(&mut self, sink: &mut impl EventSink) {
        if self.state.apply(Transition::CancelAll) {
            sink.emit(PlayerEvent::LoopModeChanged(self.state.loop_mode()));
        }
        self.projector.clear(sink);
        self.timeline =
            TimelineIndex::new(Vec::new(), self.config.sentence_lead_in, self.config.word_gap_fill);
        self.masks.clear();
        self.title.clear();
        self.transcript_ready = false;
    }

    /// React to one notification from the media element.
    pub fn handle_media_event(&mut self, event: MediaEvent, sink: &mut impl EventSink) {
        match event {
            MediaEvent::TimeAdvanced => self.on_time_advanced(sink),
            MediaEvent::PlaybackStarted => sink.emit(PlayerEvent::PlayStateChanged {
                playing: true,
                sentence: self.state.sentence_player(),
            }),
            // No session means no sentence indicator stays lit
            MediaEvent::PlaybackPaused => sink.emit(PlayerEvent::PlayStateChanged {
                playing: false,
                sentence: self.state.sentence_player(),
            }),
            MediaEvent::PlaybackEnded => self.on_ended(sink),
            MediaEvent::SeekCompleted => self.on_seek_completed(sink),
            MediaEvent::MetadataReady => {
                self.audio_ready = true;
                debug!(duration = ?self.media.duration(), "media metadata ready");
                self.resolve_last_end();
                self.emit_progress(sink);
            }
        }
    }

    pub fn toggle_sentence_loop(&mut self, sink: &mut impl EventSink) -> SentenceLoopToggle {
        let t = self.media.current_time();
        let outcome = self
            .loops
            .toggle_sentence_loop(&mut self.state, &self.timeline, t);
        if let SentenceLoopToggle::Armed {
            target: Some(index),
        } = outcome
        {
            if self.media.paused() {
                // An ended element restarts from zero on play; land on the target instead
                let ended = self
                    .media
                    .duration()
                    .is_some_and(|duration| self.media.current_time() >= duration);
                let rewind = self
                    .timeline
                    .sentence(index)
                    .map(|sentence| self.loops.rewind_point(sentence));
                if let (true, Some(rewind)) = (ended, rewind) {
                    debug!(sentence = index, rewind, "loop armed after track end");
                    self.seek_media(SeekOrigin::Loop, rewind);
                }
                self.media.play();
            }
        }
        sink.emit(PlayerEvent::LoopModeChanged(self.state.loop_mode()));
        outcome
    }

    /// Returns `true` when the article loop is now active.
    pub fn toggle_article_loop(&mut self, sink: &mut impl EventSink) -> bool {
        let active = self.loops.toggle_article_loop(&mut self.state);
        sink.emit(PlayerEvent::LoopModeChanged(self.state.loop_mode()));
        active
    }

    /// Start a one-shot session on sentence `index`.
    pub fn play_sentence(&mut self, index: usize, sink: &mut impl EventSink) -> Result<()> {
        let before = self.state.loop_mode();
        let sentence = self
            .timeline
            .sentence(index)
            .ok_or_else(|| PlayerError::invalid_argument(format!("no sentence {}", index)))?;
        let seek_to = self.sentence_player.play_from_start(&mut self.state, sentence);
        self.start_session_playback(index, seek_to, sink);
        self.emit_loop_change(before, sink);
        Ok(())
    }

    /// Play/pause sentence `index`, or start it over when another one is current.
    pub fn toggle_sentence(
        &mut self,
        index: usize,
        sink: &mut impl EventSink,
    ) -> Result<SentenceToggle> {
        let before = self.state.loop_mode();
        let sentence = self
            .timeline
            .sentence(index)
            .ok_or_else(|| PlayerError::invalid_argument(format!("no sentence {}", index)))?;
        let t = self.media.current_time();
        let paused = self.media.paused();
        let outcome = self
            .sentence_player
            .toggle(&mut self.state, sentence, t, paused);
        match outcome {
            SentenceToggle::Resume => self.media.play(),
            SentenceToggle::Pause => self.media.pause(),
            SentenceToggle::Restart { seek_to } => self.start_session_playback(index, seek_to, sink),
        }
        self.emit_loop_change(before, sink);
        Ok(outcome)
    }

    pub fn toggle_playback(&mut self) {
        if self.media.paused() {
            self.media.play();
        } else {
            self.media.pause();
        }
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PlayerError::invalid_argument(format!(
                "playback rate must be a positive number, got {}",
                rate
            )));
        }
        self.media.set_playback_rate(rate);
        debug!(rate, "playback rate changed");
        Ok(())
    }

    /// Jump to the previous sentence; from the first (or before it) stay on the first.
    pub fn previous_sentence(&mut self, sink: &mut impl EventSink) {
        if self.timeline.is_empty() {
            return;
        }
        self.cancel_sessions(sink);
        let target = self
            .timeline
            .sentence_index_at(self.media.current_time())
            .map_or(0, |current| current.saturating_sub(1));
        self.navigate_to(target, sink);
    }

    /// Jump to the next sentence; from the last one park at the end and pause.
    pub fn next_sentence(&mut self, sink: &mut impl EventSink) {
        if self.timeline.is_empty() {
            return;
        }
        self.cancel_sessions(sink);
        let target = self
            .timeline
            .sentence_index_at(self.media.current_time())
            .map_or(0, |current| current + 1);
        if target < self.timeline.len() {
            self.navigate_to(target, sink);
        } else {
            let end = self.media.duration().unwrap_or(0.0);
            self.seek_media(SeekOrigin::Player, end);
            self.media.pause();
            debug!(end, "navigation past the last sentence");
        }
    }

    pub fn begin_scrub(&mut self, fraction: f64, sink: &mut impl EventSink) {
        self.seek.begin_drag();
        self.scrub_to(fraction, sink);
    }

    /// Seek to `fraction` of the track immediately, without waiting for a time sample.
    pub fn scrub_to(&mut self, fraction: f64, sink: &mut impl EventSink) {
        self.cancel_sessions(sink);
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let Some(duration) = self.media.duration() else {
            debug!(fraction, "scrub ignored until the duration is known");
            return;
        };
        let t = fraction * duration;
        self.seek_media(SeekOrigin::Player, t);
        sink.emit(PlayerEvent::ProgressChanged {
            current: t,
            duration: Some(duration),
        });
    }

    pub fn end_scrub(&mut self) {
        self.seek.end_drag();
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode, sink: &mut impl EventSink) {
        let previous = self.display_mode;
        self.display_mode = mode;
        if mode == DisplayMode::Cloze {
            self.regenerate_cloze(sink);
        } else if previous == DisplayMode::Cloze {
            for sentence in 0..self.masks.len() {
                sink.emit(PlayerEvent::ClozeMaskChanged {
                    sentence,
                    hidden: Vec::new(),
                });
            }
            self.masks.clear();
        }
        debug!(?previous, ?mode, "display mode changed");
    }

    /// Draw a fresh mask for every sentence.
    pub fn regenerate_cloze(&mut self, sink: &mut impl EventSink) {
        self.masks = self.cloze.generate(&self.timeline);
        for (sentence, mask) in self.masks.iter().enumerate() {
            sink.emit(PlayerEvent::ClozeMaskChanged {
                sentence,
                hidden: mask.hidden_indices(),
            });
        }
    }

    /// Report an asset failure to the renderer and hand the error back.
    pub fn report_asset_failure(&self, error: PlayerError, sink: &mut impl EventSink) -> PlayerError {
        warn!(error = %error, "asset failed to load");
        sink.emit(PlayerEvent::AssetFailed(error.message().to_string()));
        error
    }

    fn on_time_advanced(&mut self, sink: &mut impl EventSink) {
        let t = self.media.current_time();
        if self.seek.allows_progress_update() {
            self.emit_progress(sink);
        }

        let before = self.state.loop_mode();
        if let Some(rewind) = self
            .loops
            .on_time_sample(&mut self.state, &self.timeline, t)
        {
            self.seek_media(SeekOrigin::Loop, rewind);
        } else if let Some(finished) =
            self.sentence_player
                .on_time_sample(&mut self.state, &self.timeline, t)
        {
            self.media.pause();
            self.seek_media(SeekOrigin::Player, finished.rewind_to);
        }
        self.emit_loop_change(before, sink);
        self.project(sink);
    }

    fn on_ended(&mut self, sink: &mut impl EventSink) {
        let t = self.media.current_time();
        let before = self.state.loop_mode();
        if let Some(restart) = self.loops.on_ended(&mut self.state, &self.timeline, t) {
            self.seek_media(SeekOrigin::Loop, restart);
            self.media.play();
        } else if let Some(index) = self.state.sentence_player() {
            // The last sentence may still be open-ended; the track end is its boundary
            self.state.apply(Transition::EndSentencePlayer);
            if let Some(start) = self.timeline.sentence(index).map(|sentence| sentence.start) {
                self.seek_media(SeekOrigin::Player, start);
            }
            info!(sentence = index, "track ended during sentence session");
        }
        self.emit_loop_change(before, sink);
    }

    fn on_seek_completed(&mut self, sink: &mut impl EventSink) {
        match self.seek.on_seek_completed() {
            SeekOrigin::External => {
                info!(
                    time = self.media.current_time(),
                    "external seek; cancelling loop and session"
                );
                if self.state.apply(Transition::CancelAll) {
                    sink.emit(PlayerEvent::LoopModeChanged(self.state.loop_mode()));
                }
            }
            origin => debug!(?origin, "own seek completed"),
        }
        if self.seek.allows_progress_update() {
            self.emit_progress(sink);
        }
        self.project(sink);
    }

    fn start_session_playback(&mut self, index: usize, seek_to: f64, sink: &mut impl EventSink) {
        self.seek_media(SeekOrigin::Player, seek_to);
        self.media.play();
        self.projector.activate_sentence(index, sink);
    }

    fn navigate_to(&mut self, index: usize, sink: &mut impl EventSink) {
        let Some(start) = self.timeline.sentence(index).map(|sentence| sentence.start) else {
            return;
        };
        self.seek_media(SeekOrigin::Player, start);
        debug!(sentence = index, start, "navigated");
        self.project(sink);
    }

    /// Move the playhead on our own behalf; only seeks the media will complete are tagged.
    fn seek_media(&mut self, origin: SeekOrigin, t: f64) {
        if self.media.set_current_time(t) {
            self.seek.announce(origin);
        } else {
            debug!(?origin, time = t, "seek dropped; no media source");
        }
    }

    fn cancel_sessions(&mut self, sink: &mut impl EventSink) {
        if self.state.apply(Transition::CancelAll) {
            sink.emit(PlayerEvent::LoopModeChanged(self.state.loop_mode()));
        }
    }

    fn project(&mut self, sink: &mut impl EventSink) {
        let suppress_scroll = self.state.sentence_player().is_some();
        self.projector.project(
            &self.timeline,
            self.media.current_time(),
            suppress_scroll,
            sink,
        );
    }

    fn emit_progress(&self, sink: &mut impl EventSink) {
        sink.emit(PlayerEvent::ProgressChanged {
            current: self.media.current_time(),
            duration: self.media.duration(),
        });
    }

    fn emit_loop_change(&self, before: LoopMode, sink: &mut impl EventSink) {
        if self.state.loop_mode() != before {
            sink.emit(PlayerEvent::LoopModeChanged(self.state.loop_mode()));
        }
    }

    /// Resolve the last sentence's end once both assets are in.
    fn resolve_last_end(&mut self) {
        if !self.is_ready() {
            return;
        }
        if let Some(duration) = self.media.duration() {
            self.timeline.resolve_last_end(duration);
        }
    }
}

impl Player<VirtualMedia> {
    /// Advance the virtual clock by `dt` seconds and handle everything it reports.
    pub fn advance(&mut self, dt: f64, sink: &mut impl EventSink) {
        let events = self.media.advance(dt);
        self.settle(events, sink);
    }

    /// Handle notifications queued by commands without moving the clock.
    pub fn pump(&mut self, sink: &mut impl EventSink) {
        let events = self.media.take_events();
        self.settle(events, sink);
    }

    fn settle(&mut self, mut events: Vec<MediaEvent>, sink: &mut impl EventSink) {
        for _ in 0..MAX_SETTLE_ROUNDS {
            if events.is_empty() {
                return;
            }
            for event in events {
                self.handle_media_event(event, sink);
            }
            events = self.media.take_events();
        }
        if !events.is_empty() {
            warn!(pending = events.len(), "media notifications still pending after settling");
            for event in events {
                self.handle_media_event(event, sink);
            }
        }
    }
}
