//! Playback Coordinator - owns one playback session
//!
//! Coordinates:
//! - Session intent (config snapshot taken at `play()`)
//! - Render surface setup and engine attachment
//! - Engine lifecycle with one-shot release
//! - Folding engine notifications into the coarse state machine
//! - Delivery to the single registered listener
//!
//! Notifications can arrive on any thread. They are queued in a mailbox and
//! drained by one thread at a time, so transitions are serialized and a
//! listener that re-enters the coordinator (or an engine that notifies from
//! inside a lifecycle call) only appends to the queue instead of deadlocking.

use crate::{
    engine::{EngineError, MediaEngine},
    event::{fold, EngineNotification},
    listener::{notify, StateListener},
    surface::RenderSurface,
    types::*,
    Error, Result,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Work queued for the state machine
#[derive(Debug)]
enum Pending {
    /// `play()` accepted: Idle -> Loading
    Begin,
    Notification(EngineNotification),
    /// Synchronous engine failure during start
    Failure(EngineError),
}

#[derive(Default)]
struct Mailbox {
    queue: VecDeque<Pending>,
    draining: bool,
}

/// Clears the draining flag if a listener panics mid-drain
struct DrainGuard<'a> {
    mailbox: &'a Mutex<Mailbox>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut mailbox = lock(self.mailbox);
            mailbox.draining = false;
            mailbox.queue.clear();
        }
    }
}

struct Shared {
    id: SessionId,
    surface: Arc<dyn RenderSurface>,
    /// Taken exactly once by `release()`
    engine: Mutex<Option<Arc<dyn MediaEngine>>>,
    /// Pending intent, editable until `play()`
    config: Mutex<Option<PlaybackConfig>>,
    /// Immutable snapshot of the running session
    active: Mutex<Option<PlaybackConfig>>,
    state: Mutex<PlaybackState>,
    state_tx: watch::Sender<PlaybackState>,
    listener: Mutex<Option<Arc<dyn StateListener>>>,
    engine_error: Mutex<Option<EngineError>>,
    mailbox: Mutex<Mailbox>,
    started: AtomicBool,
    closed: AtomicBool,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn submit(&self, item: Pending) {
        if self.is_closed() {
            debug!(session_id = %self.id, item = ?item, "Dropped after release");
            return;
        }

        {
            let mut mailbox = lock(&self.mailbox);
            mailbox.queue.push_back(item);
            if mailbox.draining {
                return;
            }
            mailbox.draining = true;
        }

        let _guard = DrainGuard {
            mailbox: &self.mailbox,
        };

        loop {
            let next = {
                let mut mailbox = lock(&self.mailbox);
                match mailbox.queue.pop_front() {
                    Some(item) => item,
                    None => {
                        mailbox.draining = false;
                        return;
                    }
                }
            };
            self.process(next);
        }
    }

    fn process(&self, item: Pending) {
        if self.is_closed() {
            debug!(session_id = %self.id, item = ?item, "Dropped after release");
            return;
        }

        let current = *lock(&self.state);
        let next = match item {
            Pending::Begin => (current == PlaybackState::Idle).then_some(PlaybackState::Loading),
            Pending::Notification(notification) => {
                let next = fold(current, &notification);
                match next {
                    None => debug!(
                        session_id = %self.id,
                        code = notification.code,
                        arg1 = notification.arg1,
                        arg2 = notification.arg2,
                        state = %current,
                        "Notification ignored"
                    ),
                    Some(PlaybackState::Error) => self.record_failure(EngineError::new(
                        notification.arg1,
                        notification.arg2,
                        "engine reported an error",
                    )),
                    Some(_) => {}
                }
                next
            }
            Pending::Failure(err) => {
                if current.is_terminal() {
                    None
                } else {
                    self.record_failure(err);
                    Some(PlaybackState::Error)
                }
            }
        };

        if let Some(next) = next {
            self.commit(current, next);
        }
    }

    fn record_failure(&self, err: EngineError) {
        error!(session_id = %self.id, what = err.what, extra = err.extra, "{}", err.message);
        *lock(&self.engine_error) = Some(err);
    }

    fn commit(&self, from: PlaybackState, to: PlaybackState) {
        // release() may have landed while this item was being folded
        if self.is_closed() {
            debug!(session_id = %self.id, from = %from, to = %to, "Transition dropped after release");
            return;
        }

        *lock(&self.state) = to;
        self.state_tx.send_replace(to);
        info!(session_id = %self.id, from = %from, to = %to, "State transition");

        let listener = lock(&self.listener).clone();
        if let Some(listener) = listener {
            notify(listener.as_ref(), to);
        }
    }

    fn release(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!(session_id = %self.id, "Already released");
            return;
        }

        lock(&self.mailbox).queue.clear();

        let engine = lock(&self.engine).take();
        if let Some(engine) = engine {
            engine.stop();
            self.surface.detach(self.id, engine.as_ref());
            engine.release();
            let state = *lock(&self.state);
            info!(session_id = %self.id, state = %state, "Engine released");
        }
    }
}

/// Notification sink handed to the engine
///
/// Holds only a weak reference; notifications for a dropped or released
/// coordinator are discarded.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Weak<Shared>,
}

impl Dispatcher {
    /// Fold one engine notification into the session state
    pub fn dispatch(&self, notification: impl Into<EngineNotification>) {
        if let Some(shared) = self.shared.upgrade() {
            shared.submit(Pending::Notification(notification.into()));
        }
    }

    /// Raw `(code, arg1, arg2)` entry point for callback-style engines
    pub fn on_info(&self, code: i32, arg1: i32, arg2: i32) {
        self.dispatch(EngineNotification::new(code, arg1, arg2));
    }

    /// True once the session was released or dropped
    pub fn is_closed(&self) -> bool {
        self.shared
            .upgrade()
            .map(|shared| shared.is_closed())
            .unwrap_or(true)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Coordinator for a single playback session
///
/// A session ends in `Complete` or `Error`; retrying means building a new
/// coordinator. Dropping the coordinator releases the engine.
pub struct PlaybackCoordinator {
    shared: Arc<Shared>,
}

impl PlaybackCoordinator {
    /// Create a coordinator driving `engine` into `surface`
    pub fn new(engine: Arc<dyn MediaEngine>, surface: Arc<dyn RenderSurface>) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::Idle);

        Self {
            shared: Arc::new(Shared {
                id: SessionId::new(),
                surface,
                engine: Mutex::new(Some(engine)),
                config: Mutex::new(None),
                active: Mutex::new(None),
                state: Mutex::new(PlaybackState::Idle),
                state_tx,
                listener: Mutex::new(None),
                engine_error: Mutex::new(None),
                mailbox: Mutex::new(Mailbox::default()),
                started: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// Get current coarse state
    pub fn state(&self) -> PlaybackState {
        *lock(&self.shared.state)
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.shared.state_tx.subscribe()
    }

    /// Snapshot the running session was started with
    pub fn active_config(&self) -> Option<PlaybackConfig> {
        lock(&self.shared.active).clone()
    }

    /// Failure that moved the session to `Error`, if any
    pub fn engine_error(&self) -> Option<EngineError> {
        lock(&self.shared.engine_error).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Notification sink for this session
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Set the playback intent
    ///
    /// Once `play()` has started the session the call is validated but has
    /// no effect; the running session keeps its snapshot.
    #[instrument(skip(self, config), fields(session_id = %self.shared.id))]
    pub fn configure(&self, config: PlaybackConfig) -> Result<()> {
        self.shared.ensure_open()?;
        let config = config.normalize()?;

        if self.shared.started.load(Ordering::Acquire) {
            warn!(source = %config.source_uri, "Configure after start ignored");
            return Ok(());
        }

        info!(
            source = %config.source_uri,
            is_live = config.is_live,
            scale_mode = %config.scale_mode,
            fullscreen_only = config.fullscreen_only,
            play_in_fullscreen = config.play_in_fullscreen,
            "Configured"
        );
        *lock(&self.shared.config) = Some(config);
        Ok(())
    }

    /// Register the state listener, replacing any previous one
    pub fn set_state_listener(&self, listener: Arc<dyn StateListener>) {
        if lock(&self.shared.listener).replace(listener).is_some() {
            debug!(session_id = %self.shared.id, "State listener replaced");
        }
    }

    /// Start playback of `uri`
    ///
    /// Returns once the engine has been asked to open and play; whether data
    /// actually flows is reported later through the listener. Engine failures
    /// end the session in `Error` and are not returned here.
    #[instrument(skip(self), fields(session_id = %self.shared.id))]
    pub fn play(&self, uri: &str) -> Result<()> {
        let shared = &self.shared;
        shared.ensure_open()?;
        parse_source(uri).map_err(|e| match e {
            Error::InvalidSource(msg) => Error::InvalidConfig(msg),
            other => other,
        })?;
        let uri = normalize_source(uri);

        let snapshot = {
            let mut config = lock(&shared.config);
            let config = config
                .as_mut()
                .ok_or_else(|| Error::config("play() called before configure()"))?;

            if shared
                .started
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(Error::AlreadyStarted);
            }

            if config.source_uri != uri {
                info!(from = %config.source_uri, to = %uri, "Source updated");
                config.source_uri = uri;
            }
            config.clone()
        };

        let engine = lock(&shared.engine).clone().ok_or(Error::SessionClosed)?;

        // Ownership first: a busy surface must keep its owner's presentation
        if let Err(err) = shared.surface.attach_engine(shared.id, engine.as_ref()) {
            shared.started.store(false, Ordering::Release);
            return Err(err);
        }
        if let Err(err) = shared.surface.bind_source(&snapshot.source_uri) {
            shared.surface.detach(shared.id, engine.as_ref());
            shared.started.store(false, Ordering::Release);
            return Err(err);
        }
        shared.surface.set_scale_mode(snapshot.scale_mode);
        shared.surface.set_fullscreen(snapshot.starts_fullscreen());

        // release() closes before it detaches, so either its detach saw this
        // attach or this check sees the close
        if shared.is_closed() {
            shared.surface.detach(shared.id, engine.as_ref());
            return Err(Error::SessionClosed);
        }

        *lock(&shared.active) = Some(snapshot.clone());
        engine.set_notifier(self.dispatcher());
        shared.submit(Pending::Begin);

        // An engine error delivered on set_notifier() already ended the session
        if shared.is_closed() || self.state().is_terminal() {
            debug!(state = %self.state(), "Session ended before engine start");
            return Ok(());
        }

        info!(source = %snapshot.source_uri, is_live = snapshot.is_live, "Starting engine");
        if let Err(err) = engine.open(&snapshot.source_uri).and_then(|()| engine.play()) {
            shared.submit(Pending::Failure(err));
        }

        Ok(())
    }

    /// Toggle fullscreen presentation
    ///
    /// Returns `false` when the request conflicts with `fullscreen_only`.
    pub fn set_fullscreen(&self, fullscreen: bool) -> Result<bool> {
        let shared = &self.shared;
        shared.ensure_open()?;

        let fullscreen_only = {
            let active = lock(&shared.active);
            let config = lock(&shared.config);
            active.as_ref().or(config.as_ref()).map(|c| c.fullscreen_only)
        }
        .ok_or_else(|| Error::config("set_fullscreen() called before configure()"))?;

        if fullscreen_only && !fullscreen {
            warn!(session_id = %shared.id, "Leaving fullscreen refused: fullscreen only");
            return Ok(false);
        }

        shared.surface.set_fullscreen(fullscreen);
        Ok(true)
    }

    /// Seek within a VOD session
    #[instrument(skip(self), fields(session_id = %self.shared.id))]
    pub fn seek(&self, position: Duration) -> Result<()> {
        let shared = &self.shared;
        shared.ensure_open()?;

        let is_live = lock(&shared.active)
            .as_ref()
            .map(|c| c.is_live)
            .ok_or(Error::NotStarted)?;
        if is_live {
            return Err(Error::SeekUnsupported);
        }

        let engine = lock(&shared.engine).clone().ok_or(Error::SessionClosed)?;
        engine.seek_to(position)?;
        info!(position = ?position, "Seeking");
        Ok(())
    }

    /// Stop playback; the engine is released and the session closed
    #[instrument(skip(self), fields(session_id = %self.shared.id))]
    pub fn stop(&self) {
        info!("Stopping playback");
        self.shared.release();
    }

    /// Release the engine
    ///
    /// Safe from any state, from any thread and from inside a listener
    /// callback. Only the first call reaches the engine; afterwards every
    /// operation fails with `SessionClosed`.
    #[instrument(skip(self), fields(session_id = %self.shared.id))]
    pub fn release(&self) {
        self.shared.release();
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.shared.release();
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}
