use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Convenient alias for results returned by the player library.
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Broad category of a [`PlayerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transcript or audio could not be fetched or parsed. Terminal for that load.
    Asset,
    /// Configuration values out of range.
    Config,
    /// A command was issued with an unusable argument.
    InvalidArgument,
}

/// Lightweight error type shared by the player components.
#[derive(Debug, Clone)]
pub struct PlayerError {
    kind: ErrorKind,
    message: Arc<str>,
}

impl PlayerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Arc::from(message.into()),
        }
    }

    pub fn asset(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Asset, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for PlayerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for PlayerError {}
