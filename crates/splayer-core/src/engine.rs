//! Media engine seam
//!
//! The engine does all network, demux, decode and render work behind this
//! trait. The coordinator only drives its lifecycle and consumes the
//! notifications it emits through the [`Dispatcher`] it is handed.

use crate::coordinator::Dispatcher;
use crate::surface::DrawableTarget;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by an engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("engine failure (what={what}, extra={extra}): {message}")]
pub struct EngineError {
    /// Engine-specific error class
    pub what: i32,
    /// Engine-specific detail code
    pub extra: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(what: i32, extra: i32, message: impl Into<String>) -> Self {
        Self {
            what,
            extra,
            message: message.into(),
        }
    }

    pub fn unsupported(operation: &str) -> Self {
        Self::new(0, 0, format!("{} not supported by this engine", operation))
    }
}

/// Opaque media engine
///
/// Methods take `&self`: implementations wrap their own native handle and
/// synchronize internally, so the coordinator never holds a lock while
/// calling into the engine. Notifications may be emitted from any thread,
/// including synchronously from inside these calls.
pub trait MediaEngine: Send + Sync {
    /// Register the notification sink for this session
    fn set_notifier(&self, dispatcher: Dispatcher);

    /// Target subsequent decoded frames at `target`; `None` detaches
    fn set_display(&self, target: Option<DrawableTarget>);

    fn open(&self, uri: &str) -> Result<(), EngineError>;

    fn play(&self) -> Result<(), EngineError>;

    fn stop(&self);

    fn release(&self);

    /// Seek within a VOD source
    fn seek_to(&self, position: Duration) -> Result<(), EngineError> {
        let _ = position;
        Err(EngineError::unsupported("seek"))
    }
}
