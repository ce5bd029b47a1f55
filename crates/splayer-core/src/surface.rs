//! Render surface - the drawable target the engine writes frames into
//!
//! A surface owns presentation settings only. It never interprets the
//! stream. At most one session is attached at a time so two engines can
//! never write into the same target.

use crate::engine::MediaEngine;
use crate::error::{Error, Result};
use crate::types::{parse_source, ScaleMode, SessionId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use url::Url;

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to a drawable target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableTarget(u64);

impl DrawableTarget {
    /// Allocate a process-unique handle
    pub fn allocate() -> Self {
        Self(NEXT_TARGET.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for DrawableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Host-side drawable target
pub trait RenderSurface: Send + Sync {
    /// Applies from the next rendered frame
    fn set_scale_mode(&self, mode: ScaleMode);

    fn set_fullscreen(&self, fullscreen: bool);

    /// Associate a source with the surface; fails on empty or malformed URIs
    fn bind_source(&self, uri: &str) -> Result<()>;

    /// Hand the drawable target to `engine` on behalf of `session`
    fn attach_engine(&self, session: SessionId, engine: &dyn MediaEngine) -> Result<()>;

    /// Drop the binding if `session` still owns it
    fn detach(&self, session: SessionId, engine: &dyn MediaEngine) -> bool;
}

#[derive(Debug)]
struct ViewState {
    scale_mode: ScaleMode,
    fullscreen: bool,
    source: Option<Url>,
    owner: Option<SessionId>,
}

/// In-process video view
#[derive(Debug)]
pub struct VideoView {
    target: DrawableTarget,
    state: Mutex<ViewState>,
}

impl Default for VideoView {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoView {
    pub fn new() -> Self {
        Self {
            target: DrawableTarget::allocate(),
            state: Mutex::new(ViewState {
                scale_mode: ScaleMode::default(),
                fullscreen: false,
                source: None,
                owner: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn target(&self) -> DrawableTarget {
        self.target
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.lock().scale_mode
    }

    pub fn is_fullscreen(&self) -> bool {
        self.lock().fullscreen
    }

    pub fn source(&self) -> Option<Url> {
        self.lock().source.clone()
    }

    /// Session currently writing into this view
    pub fn owner(&self) -> Option<SessionId> {
        self.lock().owner
    }
}

impl RenderSurface for VideoView {
    fn set_scale_mode(&self, mode: ScaleMode) {
        debug!(target_id = %self.target, mode = %mode, "Scale mode set");
        self.lock().scale_mode = mode;
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        debug!(target_id = %self.target, fullscreen, "Fullscreen set");
        self.lock().fullscreen = fullscreen;
    }

    fn bind_source(&self, uri: &str) -> Result<()> {
        let url = parse_source(uri)?;
        self.lock().source = Some(url);
        Ok(())
    }

    fn attach_engine(&self, session: SessionId, engine: &dyn MediaEngine) -> Result<()> {
        {
            let mut state = self.lock();
            match state.owner {
                Some(owner) if owner != session => return Err(Error::SurfaceBusy { owner }),
                _ => state.owner = Some(session),
            }
        }

        engine.set_display(Some(self.target));
        info!(target_id = %self.target, session_id = %session, "Engine attached");
        Ok(())
    }

    fn detach(&self, session: SessionId, engine: &dyn MediaEngine) -> bool {
        {
            let mut state = self.lock();
            if state.owner != Some(session) {
                return false;
            }
            state.owner = None;
        }

        engine.set_display(None);
        info!(target_id = %self.target, session_id = %session, "Engine detached");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedEngine;

    #[test]
    fn test_targets_are_unique() {
        assert_ne!(VideoView::new().target(), VideoView::new().target());
    }

    #[test]
    fn test_bind_source_validates() {
        let view = VideoView::new();
        assert!(matches!(view.bind_source(""), Err(Error::InvalidSource(_))));
        assert!(matches!(view.bind_source("::nope"), Err(Error::InvalidSource(_))));
        assert!(view.source().is_none());

        view.bind_source("http://example/stream.m3u8").unwrap();
        assert_eq!(view.source().unwrap().as_str(), "http://example/stream.m3u8");
    }

    #[test]
    fn test_presentation_settings() {
        let view = VideoView::new();
        assert_eq!(view.scale_mode(), ScaleMode::FitParent);
        view.set_scale_mode(ScaleMode::WrapContent);
        view.set_fullscreen(true);
        assert_eq!(view.scale_mode(), ScaleMode::WrapContent);
        assert!(view.is_fullscreen());
    }

    #[test]
    fn test_single_writer() {
        let view = VideoView::new();
        let engine = ScriptedEngine::new(Vec::new());
        let first = SessionId::new();
        let second = SessionId::new();

        view.attach_engine(first, &engine).unwrap();
        assert_eq!(engine.display(), Some(view.target()));
        // Re-attaching the same session is a no-op
        view.attach_engine(first, &engine).unwrap();

        match view.attach_engine(second, &engine) {
            Err(Error::SurfaceBusy { owner }) => assert_eq!(owner, first),
            other => panic!("expected SurfaceBusy, got {:?}", other),
        }

        assert!(!view.detach(second, &engine));
        assert!(view.detach(first, &engine));
        assert_eq!(engine.display(), None);
        assert!(view.owner().is_none());

        view.attach_engine(second, &engine).unwrap();
        assert_eq!(view.owner(), Some(second));
    }
}
