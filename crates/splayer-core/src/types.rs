//! Core types for SPlayer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How decoded frames are mapped onto the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Scale to fit inside the parent, keeping aspect ratio
    #[default]
    FitParent,
    /// Scale to cover the parent, keeping aspect ratio (crops)
    FillParent,
    /// Native video size, centered
    WrapContent,
    /// Stretch to the parent bounds
    MatchParent,
    /// Fit inside the parent at 16:9
    #[serde(rename = "fit_16x9")]
    Fit16x9,
    /// Fit inside the parent at 4:3
    #[serde(rename = "fit_4x3")]
    Fit4x3,
}

impl ScaleMode {
    pub const ALL: [ScaleMode; 6] = [
        ScaleMode::FitParent,
        ScaleMode::FillParent,
        ScaleMode::WrapContent,
        ScaleMode::MatchParent,
        ScaleMode::Fit16x9,
        ScaleMode::Fit4x3,
    ];
}

impl std::fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleMode::FitParent => write!(f, "fit_parent"),
            ScaleMode::FillParent => write!(f, "fill_parent"),
            ScaleMode::WrapContent => write!(f, "wrap_content"),
            ScaleMode::MatchParent => write!(f, "match_parent"),
            ScaleMode::Fit16x9 => write!(f, "fit_16x9"),
            ScaleMode::Fit4x3 => write!(f, "fit_4x3"),
        }
    }
}

impl FromStr for ScaleMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        ScaleMode::ALL
            .into_iter()
            .find(|mode| mode.to_string() == wanted)
            .ok_or_else(|| Error::config(format!("unknown scale mode '{}'", s)))
    }
}

/// Playback intent for one session
///
/// Owned by the coordinator; a snapshot is taken when `play()` starts the
/// session, so later edits never reach an in-flight engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Media resource to open
    pub source_uri: String,
    /// Live stream: no seeking, no duration
    #[serde(default)]
    pub is_live: bool,
    /// Frame-to-surface mapping
    #[serde(default)]
    pub scale_mode: ScaleMode,
    /// Only ever present in fullscreen
    #[serde(default)]
    pub fullscreen_only: bool,
    /// Enter fullscreen automatically when playback starts
    #[serde(default)]
    pub play_in_fullscreen: bool,
}

impl PlaybackConfig {
    /// Create a VOD config for the given source with default presentation
    pub fn new(source_uri: impl Into<String>) -> Self {
        Self {
            source_uri: source_uri.into(),
            is_live: false,
            scale_mode: ScaleMode::default(),
            fullscreen_only: false,
            play_in_fullscreen: false,
        }
    }

    pub fn live(mut self, is_live: bool) -> Self {
        self.is_live = is_live;
        self
    }

    pub fn scale_mode(mut self, mode: ScaleMode) -> Self {
        self.scale_mode = mode;
        self
    }

    pub fn fullscreen_only(mut self, fullscreen_only: bool) -> Self {
        self.fullscreen_only = fullscreen_only;
        self
    }

    pub fn play_in_fullscreen(mut self, play_in_fullscreen: bool) -> Self {
        self.play_in_fullscreen = play_in_fullscreen;
        self
    }

    /// Load a config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlaybackConfig = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("malformed config: {}", e)))?;
        config.normalize()
    }

    /// Validate and store the source in the trimmed form the engine receives
    pub fn normalize(mut self) -> Result<Self> {
        self.validate()?;
        self.source_uri = normalize_source(&self.source_uri);
        Ok(self)
    }

    /// Check the source URI is present and well formed
    pub fn validate(&self) -> Result<Url> {
        parse_source(&self.source_uri).map_err(|e| match e {
            Error::InvalidSource(msg) => Error::InvalidConfig(msg),
            other => other,
        })
    }

    /// Fullscreen state the surface starts in
    pub fn starts_fullscreen(&self) -> bool {
        self.fullscreen_only || self.play_in_fullscreen
    }
}

/// Canonical spelling of a source identifier
pub(crate) fn normalize_source(uri: &str) -> String {
    uri.trim().to_string()
}

/// Parse a media source identifier
pub(crate) fn parse_source(uri: &str) -> Result<Url> {
    let trimmed = uri.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidSource("source URI is empty".to_string()));
    }
    Url::parse(trimmed).map_err(|e| Error::InvalidSource(format!("'{}': {}", trimmed, e)))
}

/// Coarse playback state exposed to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Opening, buffering or stalled
    Loading,
    /// Data flowing, frames rendering
    Playing,
    /// Reached end of stream
    Complete,
    /// Engine reported a failure
    Error,
}

impl PlaybackState {
    /// Complete and Error end the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Complete | PlaybackState::Error)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Complete => write!(f, "complete"),
            PlaybackState::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(PlaybackConfig::new("http://example/stream.m3u8").validate().is_ok());
        assert!(matches!(
            PlaybackConfig::new("").validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            PlaybackConfig::new("   ").validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            PlaybackConfig::new("not a uri").validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config = PlaybackConfig::from_json(
            r#"{ "source_uri": "http://example/live.m3u8", "is_live": true, "scale_mode": "wrap_content" }"#,
        )
        .unwrap();

        assert!(config.is_live);
        assert_eq!(config.scale_mode, ScaleMode::WrapContent);
        assert!(!config.fullscreen_only);
        assert!(!config.play_in_fullscreen);
    }

    #[test]
    fn test_normalize_trims_source() {
        let config = PlaybackConfig::new("  http://example/a.m3u8\n")
            .normalize()
            .unwrap();
        assert_eq!(config.source_uri, "http://example/a.m3u8");

        let loaded =
            PlaybackConfig::from_json(r#"{ "source_uri": " http://example/b.mp4 " }"#).unwrap();
        assert_eq!(loaded.source_uri, "http://example/b.mp4");

        assert!(PlaybackConfig::new(" \t ").normalize().is_err());
    }

    #[test]
    fn test_config_from_json_rejects_missing_source() {
        assert!(PlaybackConfig::from_json(r#"{ "is_live": true }"#).is_err());
        assert!(PlaybackConfig::from_json(r#"{ "source_uri": "" }"#).is_err());
    }

    #[test]
    fn test_scale_mode_round_trips_through_str() {
        for mode in ScaleMode::ALL {
            assert_eq!(mode.to_string().parse::<ScaleMode>().unwrap(), mode);
        }
        assert_eq!("Wrap-Content".parse::<ScaleMode>().unwrap(), ScaleMode::WrapContent);
        assert!("sideways".parse::<ScaleMode>().is_err());
    }

    #[test]
    fn test_fullscreen_start_policy() {
        let config = PlaybackConfig::new("http://example/a.mp4");
        assert!(!config.starts_fullscreen());
        assert!(config.clone().fullscreen_only(true).starts_fullscreen());
        assert!(config.play_in_fullscreen(true).starts_fullscreen());
    }

    #[test]
    fn test_terminal_states() {
        assert!(PlaybackState::Complete.is_terminal());
        assert!(PlaybackState::Error.is_terminal());
        assert!(!PlaybackState::Idle.is_terminal());
        assert!(!PlaybackState::Loading.is_terminal());
        assert!(!PlaybackState::Playing.is_terminal());
    }
}
