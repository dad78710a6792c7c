//! Seek arbitration between user scrubbing, corrective seeks and natural playback

use tracing::trace;

/// Who asked for the most recent time reassignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Rewind issued by the loop controller.
    Loop,
    /// Seek issued by the player itself: sentence playback, navigation, scrubbing.
    Player,
    /// Nobody announced it; the user or another collaborator moved the playhead.
    External,
}

/// Two independent flags: one suppresses progress recomputation while the user
/// drags the seek control, the other tags the next seek completion as our own.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeekArbiter {
    dragging: bool,
    pending: Option<SeekOrigin>,
}

impl SeekArbiter {
    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Periodic samples may redraw progress only while nobody is dragging.
    pub fn allows_progress_update(&self) -> bool {
        !self.dragging
    }

    /// Call immediately before reassigning the media time.
    pub fn announce(&mut self, origin: SeekOrigin) {
        trace!(?origin, "seek announced");
        self.pending = Some(origin);
    }

    pub fn pending(&self) -> Option<SeekOrigin> {
        self.pending
    }

    /// Consume the pending tag on a seek completion.
    pub fn on_seek_completed(&mut self) -> SeekOrigin {
        self.pending.take().unwrap_or(SeekOrigin::External)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
