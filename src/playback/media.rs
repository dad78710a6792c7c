//! Media time source seam
//!
//! The player never owns a decoder or an output device. It reads the playhead from a
//! [`MediaSource`] and reacts to the [`MediaEvent`]s that source delivers.

use std::collections::VecDeque;

use tracing::trace;

/// Notifications delivered by the media element, in the order it produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    TimeAdvanced,
    PlaybackStarted,
    PlaybackPaused,
    PlaybackEnded,
    SeekCompleted,
    MetadataReady,
}

/// Commands and state the core needs from the media element.
pub trait MediaSource {
    fn current_time(&self) -> f64;
    /// `None` until metadata is available, or when the stream has no finite length.
    fn duration(&self) -> Option<f64>;
    fn paused(&self) -> bool;
    /// Returns whether a `SeekCompleted` will follow; `false` when no source is attached.
    fn set_current_time(&mut self, seconds: f64) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn set_playback_rate(&mut self, rate: f64);
}

/// Deterministic media clock advanced explicitly by the caller.
///
/// Mirrors a browser media element closely enough to drive the player: seeks complete
/// on the next turn, reaching the duration pauses and then reports `PlaybackEnded`,
/// and `play()` at the end restarts from zero.
#[derive(Debug, Clone)]
pub struct VirtualMedia {
    current_time: f64,
    duration: Option<f64>,
    has_source: bool,
    paused: bool,
    rate: f64,
    seek_pending: bool,
    queued: VecDeque<MediaEvent>,
}

impl Default for VirtualMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualMedia {
    pub fn new() -> Self {
        Self {
            current_time: 0.0,
            duration: None,
            has_source: true,
            paused: true,
            rate: 1.0,
            seek_pending: false,
            queued: VecDeque::new(),
        }
    }

    /// An element with no source attached yet; seeks are dropped until `set_duration`.
    pub fn unloaded() -> Self {
        Self {
            has_source: false,
            ..Self::new()
        }
    }

    pub fn with_duration(duration: f64) -> Self {
        let mut media = Self::new();
        media.set_duration(duration);
        media
    }

    /// Publish the stream length and queue `MetadataReady`.
    pub fn set_duration(&mut self, duration: f64) {
        self.has_source = true;
        self.duration = Some(duration).filter(|d| d.is_finite() && *d > 0.0);
        self.queued.push_back(MediaEvent::MetadataReady);
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    /// Drain notifications queued by commands without moving the playhead.
    pub fn take_events(&mut self) -> Vec<MediaEvent> {
        let mut events = Vec::with_capacity(self.queued.len() + 1);
        if self.seek_pending {
            self.seek_pending = false;
            events.push(MediaEvent::SeekCompleted);
        }
        events.extend(self.queued.drain(..));
        events
    }

    /// Move the playhead by `dt` seconds of wall time and report what happened.
    pub fn advance(&mut self, dt: f64) -> Vec<MediaEvent> {
        let mut events = self.take_events();
        if self.paused {
            return events;
        }
        self.current_time += dt * self.rate;
        match self.duration {
            Some(duration) if self.current_time >= duration => {
                self.current_time = duration;
                self.paused = true;
                events.push(MediaEvent::TimeAdvanced);
                events.push(MediaEvent::PlaybackPaused);
                events.push(MediaEvent::PlaybackEnded);
            }
            _ => events.push(MediaEvent::TimeAdvanced),
        }
        trace!(time = self.current_time, events = events.len(), "virtual media advanced");
        events
    }
}

impl MediaSource for VirtualMedia {
    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn set_current_time(&mut self, seconds: f64) -> bool {
        if !self.has_source {
            return false;
        }
        let upper = self.duration.unwrap_or(f64::INFINITY);
        self.current_time = if seconds.is_finite() {
            seconds.clamp(0.0, upper)
        } else {
            0.0
        };
        self.seek_pending = true;
        true
    }

    fn play(&mut self) {
        if !self.paused {
            return;
        }
        if self
            .duration
            .is_some_and(|duration| self.current_time >= duration)
        {
            self.current_time = 0.0;
            self.seek_pending = true;
        }
        self.paused = false;
        self.queued.push_back(MediaEvent::PlaybackStarted);
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.queued.push_back(MediaEvent::PlaybackPaused);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_media_does_not_advance() {
        let mut media = VirtualMedia::with_duration(10.0);
        assert_eq!(media.advance(1.0), vec![MediaEvent::MetadataReady]);
        assert_eq!(media.current_time(), 0.0);
    }

    #[test]
    fn seek_completes_on_next_turn() {
        let mut media = VirtualMedia::with_duration(10.0);
        media.take_events();
        media.set_current_time(4.0);
        assert_eq!(media.current_time(), 4.0);
        assert_eq!(media.take_events(), vec![MediaEvent::SeekCompleted]);
        assert!(media.take_events().is_empty());
    }

    #[test]
    fn unloaded_media_drops_seeks() {
        let mut media = VirtualMedia::unloaded();
        assert!(!media.set_current_time(3.0));
        assert_eq!(media.current_time(), 0.0);
        assert!(media.take_events().is_empty());

        media.set_duration(5.0);
        assert!(media.set_current_time(3.0));
        assert_eq!(
            media.take_events(),
            vec![MediaEvent::SeekCompleted, MediaEvent::MetadataReady]
        );
    }

    #[test]
    fn reaching_duration_pauses_then_ends() {
        let mut media = VirtualMedia::with_duration(1.0);
        media.play();
        media.take_events();
        let events = media.advance(2.0);
        assert_eq!(
            events,
            vec![
                MediaEvent::TimeAdvanced,
                MediaEvent::PlaybackPaused,
                MediaEvent::PlaybackEnded
            ]
        );
        assert!(media.paused());
        assert_eq!(media.current_time(), 1.0);
    }

    #[test]
    fn rate_scales_progress() {
        let mut media = VirtualMedia::with_duration(10.0);
        media.set_playback_rate(2.0);
        media.play();
        media.advance(1.0);
        assert!((media.current_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn play_at_end_restarts() {
        let mut media = VirtualMedia::with_duration(1.0);
        media.set_current_time(1.0);
        media.take_events();
        media.play();
        assert_eq!(media.current_time(), 0.0);
        assert_eq!(
            media.take_events(),
            vec![MediaEvent::SeekCompleted, MediaEvent::PlaybackStarted]
        );
    }
}
