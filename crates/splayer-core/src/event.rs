//! Engine notifications and the coarse state fold
//!
//! Engines report `(code, arg1, arg2)` tuples. [`classify`] maps a code to the
//! coarse effect it has, and [`fold`] applies that effect to the current
//! state. Both are pure so the delivery mechanism (callback thread, channel,
//! polling loop) stays out of the state machine.

use crate::types::PlaybackState;
use serde::{Deserialize, Serialize};

/// Event codes understood by the fold
pub mod code {
    /// First video frame rendered
    pub const VIDEO_RENDERING_START: i32 = 3;
    /// Engine reported a fatal error; `arg1`/`arg2` carry what/extra
    pub const ERROR: i32 = 100;
    /// Source opened, decoders ready
    pub const PREPARED: i32 = 200;
    /// End of stream reached
    pub const PLAYBACK_COMPLETE: i32 = 300;
    /// Decoder falling behind
    pub const VIDEO_TRACK_LAGGING: i32 = 700;
    /// Buffer ran dry
    pub const BUFFERING_START: i32 = 701;
    /// Buffer refilled, data flowing
    pub const BUFFERING_END: i32 = 702;
    /// Bandwidth estimate update
    pub const NETWORK_BANDWIDTH: i32 = 703;
    /// First audio sample rendered
    pub const AUDIO_RENDERING_START: i32 = 10002;
}

/// One notification as delivered by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineNotification {
    pub code: i32,
    pub arg1: i32,
    pub arg2: i32,
}

impl EngineNotification {
    pub fn new(code: i32, arg1: i32, arg2: i32) -> Self {
        Self { code, arg1, arg2 }
    }

    pub fn buffering_start() -> Self {
        Self::new(code::BUFFERING_START, 0, 0)
    }

    pub fn buffering_end() -> Self {
        Self::new(code::BUFFERING_END, 0, 0)
    }

    pub fn rendering_start() -> Self {
        Self::new(code::VIDEO_RENDERING_START, 0, 0)
    }

    pub fn complete() -> Self {
        Self::new(code::PLAYBACK_COMPLETE, 0, 0)
    }

    pub fn error(what: i32, extra: i32) -> Self {
        Self::new(code::ERROR, what, extra)
    }
}

impl From<(i32, i32, i32)> for EngineNotification {
    fn from((code, arg1, arg2): (i32, i32, i32)) -> Self {
        Self::new(code, arg1, arg2)
    }
}

/// Coarse effect of an event code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Ignore,
    Loading,
    Playing,
    Complete,
    Error,
}

/// Map an engine event code to its coarse effect
///
/// Codes outside the table are ignored; they never surface as errors.
pub fn classify(event_code: i32) -> Transition {
    match event_code {
        code::BUFFERING_START => Transition::Loading,
        code::BUFFERING_END | code::VIDEO_RENDERING_START | code::AUDIO_RENDERING_START => {
            Transition::Playing
        }
        code::PLAYBACK_COMPLETE => Transition::Complete,
        code::ERROR => Transition::Error,
        _ => Transition::Ignore,
    }
}

/// Apply a notification to `state`
///
/// Returns the next state only when the notification causes an observable
/// transition; `None` means the listener must not be called.
pub fn fold(state: PlaybackState, notification: &EngineNotification) -> Option<PlaybackState> {
    use PlaybackState::*;

    if state.is_terminal() {
        return None;
    }

    match (state, classify(notification.code)) {
        (_, Transition::Error) => Some(Error),
        (Playing, Transition::Loading) => Some(Loading),
        (Loading, Transition::Playing) => Some(Playing),
        (Playing, Transition::Complete) => Some(Complete),
        _ => None,
    }
}
