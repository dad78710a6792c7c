use serde::Serialize;

use crate::playback::state::LoopMode;
use crate::types::WordRef;

/// Notifications emitted by the player core to the rendering layer.
///
/// Sentences and words are identified by index so the renderer can keep its own
/// index-to-element mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PlayerEvent {
    SentenceActivated(usize),
    SentenceDeactivated(usize),
    WordActivated(WordRef),
    WordDeactivated(WordRef),
    /// Bring the sentence into view.
    ScrollToSentence(usize),
    /// Word indices (within the sentence) currently hidden by the cloze mask.
    ClozeMaskChanged {
        sentence: usize,
        hidden: Vec<usize>,
    },
    ProgressChanged {
        current: f64,
        duration: Option<f64>,
    },
    /// `sentence` is the sentence whose play indicator should show "playing".
    PlayStateChanged {
        playing: bool,
        sentence: Option<usize>,
    },
    LoopModeChanged(LoopMode),
    AssetFailed(String),
}

/// Receiver of [`PlayerEvent`]s.
pub trait EventSink {
    fn emit(&mut self, event: PlayerEvent);
}

impl EventSink for Vec<PlayerEvent> {
    fn emit(&mut self, event: PlayerEvent) {
        self.push(event);
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: PlayerEvent) {}
}
