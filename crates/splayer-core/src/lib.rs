//! SPlayer Core - Playback-state coordination for embedded media engines
//!
//! This crate sits between a render surface and an opaque media engine:
//! - Session intent (source URI, live flag, scale mode, fullscreen policy)
//! - Engine lifecycle (open, play, stop, release) with one-shot release
//! - Folding of fine-grained engine notifications into coarse states
//! - Single-slot state listener with an explicit broadcast adapter
//! - Callback or channel based notification delivery
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SPlayer Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐                         ┌──────────────┐      │
//! │  │    Render    │◄──── drawable target ───│    Media     │      │
//! │  │   Surface    │                         │    Engine    │      │
//! │  └──────┬───────┘                         └──────┬───────┘      │
//! │         │ attach                (code, arg1, arg2)│             │
//! │         │                                        ▼              │
//! │  ┌──────┴────────────────────────────────────────────────┐      │
//! │  │                 Playback Coordinator                  │      │
//! │  │      Dispatcher ──► fold(state, event) ──► state      │      │
//! │  └──────────────────────────┬────────────────────────────┘      │
//! │                             │                                   │
//! │                      ┌──────┴──────┐                            │
//! │                      │    State    │  on_play / on_loading /    │
//! │                      │  Listener   │  on_error / on_complete    │
//! │                      └─────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod event;
pub mod listener;
pub mod surface;
pub mod engine;
pub mod scripted;
pub mod channel;
pub mod coordinator;

pub use error::{Error, Result};
pub use types::*;
pub use event::{classify, fold, EngineNotification, Transition};
pub use listener::{BroadcastListener, StateListener, TracingListener};
pub use surface::{DrawableTarget, RenderSurface, VideoView};
pub use engine::{EngineError, MediaEngine};
pub use scripted::{ScriptStep, ScriptedEngine};
pub use channel::{notification_channel, NotificationReceiver, NotificationSender};
pub use coordinator::{Dispatcher, PlaybackCoordinator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library (logs the version once the host installed a subscriber)
pub fn init() {
    tracing::info!(version = VERSION, "SPlayer Core initialized");
}
