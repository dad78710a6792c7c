pub mod assets;
pub mod cli;
pub mod cloze;
pub mod config;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod playback;
pub mod player;
pub mod timeline;
pub mod types;

pub use error::{ErrorKind, PlayerError, Result};
pub use player::Player;
