pub mod events;
pub mod looping;
pub mod media;
pub mod seek;
pub mod sentence;
pub mod state;

// Re-export the types most callers need
pub use events::{EventSink, NullSink, PlayerEvent};
pub use looping::{LoopController, SentenceLoopToggle};
pub use media::{MediaEvent, MediaSource, VirtualMedia};
pub use seek::{SeekArbiter, SeekOrigin};
pub use sentence::{SentencePlayer, SentenceToggle, SessionFinished};
pub use state::{LoopMode, PlaybackState, SessionMode, Transition};
