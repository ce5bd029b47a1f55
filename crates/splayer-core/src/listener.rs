//! Coarse state listeners

use crate::types::{PlaybackState, SessionId};
use std::sync::Arc;
use tracing::info;

/// Receiver of coarse state changes
///
/// Callbacks run synchronously on whichever thread delivered the engine
/// notification. They may call back into the coordinator, including
/// `release()`.
pub trait StateListener: Send + Sync {
    fn on_play(&self);
    fn on_loading(&self);
    fn on_error(&self);
    fn on_complete(&self);
}

/// Invoke the callback that corresponds to `state`
pub(crate) fn notify(listener: &dyn StateListener, state: PlaybackState) {
    match state {
        PlaybackState::Loading => listener.on_loading(),
        PlaybackState::Playing => listener.on_play(),
        PlaybackState::Complete => listener.on_complete(),
        PlaybackState::Error => listener.on_error(),
        PlaybackState::Idle => {}
    }
}

/// Fans one coordinator slot out to several listeners, in registration order
#[derive(Default, Clone)]
pub struct BroadcastListener {
    listeners: Vec<Arc<dyn StateListener>>,
}

impl BroadcastListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: Arc<dyn StateListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn push(&mut self, listener: Arc<dyn StateListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl StateListener for BroadcastListener {
    fn on_play(&self) {
        self.listeners.iter().for_each(|l| l.on_play());
    }

    fn on_loading(&self) {
        self.listeners.iter().for_each(|l| l.on_loading());
    }

    fn on_error(&self) {
        self.listeners.iter().for_each(|l| l.on_error());
    }

    fn on_complete(&self) {
        self.listeners.iter().for_each(|l| l.on_complete());
    }
}

/// Logs every coarse state change
#[derive(Debug, Clone, Default)]
pub struct TracingListener {
    session: Option<SessionId>,
}

impl TracingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag log lines with a session id
    pub fn for_session(session: SessionId) -> Self {
        Self { session: Some(session) }
    }

    fn log(&self, status: PlaybackState) {
        match self.session {
            Some(id) => info!(session_id = %id, status = %status, "player status"),
            None => info!(status = %status, "player status"),
        }
    }
}

impl StateListener for TracingListener {
    fn on_play(&self) {
        self.log(PlaybackState::Playing);
    }

    fn on_loading(&self) {
        self.log(PlaybackState::Loading);
    }

    fn on_error(&self) {
        self.log(PlaybackState::Error);
    }

    fn on_complete(&self) {
        self.log(PlaybackState::Complete);
    }
}
