//! Error types for SPlayer Core

use crate::engine::EngineError;
use crate::types::SessionId;
use thiserror::Error;

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coordinator error types
///
/// Configuration and lifecycle errors are reported synchronously. Engine
/// failures during playback never come back from `play()`; they end the
/// session through an `Error` state transition instead.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    // Lifecycle errors
    #[error("Session closed")]
    SessionClosed,

    #[error("Playback already started")]
    AlreadyStarted,

    #[error("Playback not started")]
    NotStarted,

    // Surface errors
    #[error("Render surface is bound to session {owner}")]
    SurfaceBusy { owner: SessionId },

    // Playback errors
    #[error("Seeking is not supported on live streams")]
    SeekUnsupported,

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns true if retrying with a fresh coordinator may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Engine(_))
    }

    /// Returns the stable error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidSource(_) => "INVALID_SOURCE",
            Error::SessionClosed => "SESSION_CLOSED",
            Error::AlreadyStarted => "ALREADY_STARTED",
            Error::NotStarted => "NOT_STARTED",
            Error::SurfaceBusy { .. } => "SURFACE_BUSY",
            Error::SeekUnsupported => "SEEK_UNSUPPORTED",
            Error::Engine(_) => "ENGINE",
        }
    }
}
