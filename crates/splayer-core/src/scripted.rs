//! Scripted engine - replays a fixed notification timeline
//!
//! Stands in for a native player: `play()` starts a worker thread that emits
//! the script through the registered [`Dispatcher`], the way a real engine
//! reports from its own callback thread. An inline variant emits everything
//! synchronously from inside `play()`.

use crate::coordinator::Dispatcher;
use crate::engine::{EngineError, MediaEngine};
use crate::event::EngineNotification;
use crate::surface::DrawableTarget;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// `what` code engines use for calls made in the wrong lifecycle state
const INVALID_OPERATION: i32 = -38;

/// One entry of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStep {
    /// Wait before emitting, measured from the previous step
    pub delay: Duration,
    pub notification: EngineNotification,
}

impl ScriptStep {
    pub fn after(delay: Duration, notification: EngineNotification) -> Self {
        Self {
            delay,
            notification,
        }
    }

    pub fn immediate(notification: EngineNotification) -> Self {
        Self::after(Duration::ZERO, notification)
    }
}

#[derive(Default)]
struct EngineInner {
    notifier: Option<Dispatcher>,
    display: Option<DrawableTarget>,
    uri: Option<String>,
    playing: bool,
    seeks: Vec<Duration>,
}

/// In-process engine driven by a script
pub struct ScriptedEngine {
    script: Vec<ScriptStep>,
    inline: bool,
    open_failure: Option<EngineError>,
    inner: Mutex<EngineInner>,
    cancelled: Arc<AtomicBool>,
    open_calls: AtomicUsize,
    play_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    release_calls: AtomicUsize,
}

impl ScriptedEngine {
    /// Emit `script` from a worker thread once `play()` is called
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            inline: false,
            open_failure: None,
            inner: Mutex::new(EngineInner::default()),
            cancelled: Arc::new(AtomicBool::new(false)),
            open_calls: AtomicUsize::new(0),
            play_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
        }
    }

    /// Emit `script` synchronously from inside `play()`, ignoring delays
    pub fn inline(script: Vec<ScriptStep>) -> Self {
        Self {
            inline: true,
            ..Self::new(script)
        }
    }

    /// Make `open()` fail with `err`
    pub fn with_open_failure(mut self, err: EngineError) -> Self {
        self.open_failure = Some(err);
        self
    }

    /// Stream starts, stalls once, recovers and ends
    pub fn vod_timeline(step: Duration) -> Vec<ScriptStep> {
        vec![
            ScriptStep::after(step, EngineNotification::buffering_start()),
            ScriptStep::after(step, EngineNotification::buffering_end()),
            ScriptStep::after(step, EngineNotification::rendering_start()),
            ScriptStep::after(step, EngineNotification::buffering_start()),
            ScriptStep::after(step, EngineNotification::buffering_end()),
            ScriptStep::after(step, EngineNotification::complete()),
        ]
    }

    /// Stream starts then the connection drops
    pub fn failing_timeline(step: Duration) -> Vec<ScriptStep> {
        vec![
            ScriptStep::after(step, EngineNotification::buffering_start()),
            ScriptStep::after(step, EngineNotification::buffering_end()),
            ScriptStep::after(step, EngineNotification::error(-1004, -110)),
        ]
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn display(&self) -> Option<DrawableTarget> {
        self.lock().display
    }

    pub fn opened_uri(&self) -> Option<String> {
        self.lock().uri.clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.lock().seeks.clone()
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn play_calls(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl MediaEngine for ScriptedEngine {
    fn set_notifier(&self, dispatcher: Dispatcher) {
        self.lock().notifier = Some(dispatcher);
    }

    fn set_display(&self, target: Option<DrawableTarget>) {
        self.lock().display = target;
    }

    fn open(&self, uri: &str) -> Result<(), EngineError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.open_failure {
            return Err(err.clone());
        }
        self.lock().uri = Some(uri.to_string());
        debug!(uri, "Scripted engine opened");
        Ok(())
    }

    fn play(&self) -> Result<(), EngineError> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);

        let notifier = {
            let mut inner = self.lock();
            if inner.uri.is_none() {
                return Err(EngineError::new(INVALID_OPERATION, 0, "play() before open()"));
            }
            if inner.playing {
                return Err(EngineError::new(INVALID_OPERATION, 0, "already playing"));
            }
            inner.playing = true;
            inner.notifier.clone()
        };

        let Some(notifier) = notifier else {
            return Ok(());
        };

        if self.inline {
            for step in &self.script {
                if self.cancelled.load(Ordering::SeqCst) {
                    break;
                }
                notifier.dispatch(step.notification);
            }
            return Ok(());
        }

        let script = self.script.clone();
        let cancelled = self.cancelled.clone();
        thread::Builder::new()
            .name("splayer-engine".to_string())
            .spawn(move || {
                for step in script {
                    thread::sleep(step.delay);
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    notifier.dispatch(step.notification);
                }
                debug!("Scripted engine worker finished");
            })
            .map_err(|e| EngineError::new(INVALID_OPERATION, 0, format!("spawn failed: {}", e)))?;

        Ok(())
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
        self.lock().playing = false;
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
        let mut inner = self.lock();
        inner.notifier = None;
        inner.display = None;
        info!("Scripted engine released");
    }

    fn seek_to(&self, position: Duration) -> Result<(), EngineError> {
        let mut inner = self.lock();
        if inner.uri.is_none() {
            return Err(EngineError::new(INVALID_OPERATION, 0, "seek before open()"));
        }
        inner.seeks.push(position);
        Ok(())
    }
}
