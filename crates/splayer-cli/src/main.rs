//! SPlayer CLI - Playback coordinator demo
//!
//! Plays a stream through the playback coordinator the way the embedding
//! app does: configure, attach a video view, play a fixed URL and log every
//! coarse state change (play, loading, error, complete). Frames come from a
//! scripted engine that replays a chosen scenario.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use splayer_core::{
    PlaybackConfig, PlaybackCoordinator, ScaleMode, ScriptStep, ScriptedEngine,
    TracingListener, VideoView,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod output;

use output::{format_output, Outcome, SessionReport};

/// Stream the demo opens when no URL is given
const DEFAULT_URL: &str = "http://ivi.bupt.edu.cn/hls/cctv6hd.m3u8";

/// SPlayer CLI - Playback coordinator demo
#[derive(Parser)]
#[command(name = "splayer")]
#[command(version)]
#[command(about = "Drive a playback session and log its coarse states", long_about = None)]
struct Cli {
    /// Media URL to play
    url: Option<String>,

    /// JSON playback config; flags override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scale mode (fit_parent, fill_parent, wrap_content, match_parent, fit_16x9, fit_4x3)
    #[arg(short, long)]
    scale_mode: Option<ScaleMode>,

    /// Treat the source as video on demand instead of a live stream
    #[arg(long)]
    vod: bool,

    /// Allow leaving fullscreen
    #[arg(long)]
    windowed: bool,

    /// Engine timeline to replay
    #[arg(long, value_enum, default_value_t = Scenario::Complete)]
    scenario: Scenario,

    /// Delay between scripted engine notifications in milliseconds
    #[arg(long, default_value = "500")]
    step_ms: u64,

    /// Give up waiting for a terminal state after this many seconds
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Start, stall once, recover, reach the end
    Complete,
    /// Start, then lose the connection
    Error,
    /// Start and keep buffering until the timeout
    Stall,
}

impl Scenario {
    fn timeline(self, step: Duration) -> Vec<ScriptStep> {
        match self {
            Scenario::Complete => ScriptedEngine::vod_timeline(step),
            Scenario::Error => ScriptedEngine::failing_timeline(step),
            Scenario::Stall => ScriptedEngine::failing_timeline(step)
                .into_iter()
                .take(2)
                .chain(std::iter::once(ScriptStep::after(
                    step,
                    splayer_core::EngineNotification::buffering_start(),
                )))
                .collect(),
        }
    }
}

/// Demo defaults: live, wrap content, fullscreen only
fn default_config(url: &str) -> PlaybackConfig {
    PlaybackConfig::new(url)
        .live(true)
        .scale_mode(ScaleMode::WrapContent)
        .fullscreen_only(true)
        .play_in_fullscreen(true)
}

fn build_config(cli: &Cli) -> anyhow::Result<PlaybackConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PlaybackConfig::from_json(&json)?
        }
        None => default_config(DEFAULT_URL),
    };

    if let Some(url) = &cli.url {
        config.source_uri = url.clone();
    }
    if let Some(mode) = cli.scale_mode {
        config.scale_mode = mode;
    }
    if cli.vod {
        config.is_live = false;
    }
    if cli.windowed {
        config.fullscreen_only = false;
    }

    Ok(config.normalize()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
    splayer_core::init();

    let config = build_config(&cli)?;
    let step = Duration::from_millis(cli.step_ms);

    let view = Arc::new(VideoView::new());
    let engine = Arc::new(ScriptedEngine::new(cli.scenario.timeline(step)));
    let coordinator = PlaybackCoordinator::new(engine, view.clone());
    coordinator.set_state_listener(Arc::new(TracingListener::for_session(coordinator.id())));
    coordinator.configure(config.clone())?;

    let mut states = coordinator.subscribe_state();
    let started = Instant::now();
    coordinator.play(&config.source_uri)?;
    info!(target_id = %view.target(), scenario = ?cli.scenario, "Playback requested");

    let outcome = tokio::select! {
        reached = tokio::time::timeout(
            Duration::from_secs(cli.timeout),
            states.wait_for(|state| state.is_terminal()),
        ) => match reached {
            Ok(_) => Outcome::Finished,
            Err(_) => {
                warn!(timeout_secs = cli.timeout, "No terminal state before timeout");
                Outcome::TimedOut
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Outcome::Interrupted
        }
    };

    let mut report = SessionReport::new(coordinator.id(), &config, coordinator.state());
    report.outcome = outcome;
    report.engine_error = coordinator.engine_error().map(|e| e.to_string());
    report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    coordinator.release();

    println!("{}", format_output(&report, &cli.format));
    Ok(())
}
