//! Output formatting for CLI

use serde::Serialize;
use splayer_core::{PlaybackConfig, PlaybackState, ScaleMode, SessionId};
use std::fmt;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// How the demo session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Finished,
    TimedOut,
    Interrupted,
}

/// Summary printed when the demo exits
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub source: String,
    pub is_live: bool,
    pub scale_mode: ScaleMode,
    pub fullscreen: bool,
    pub final_state: PlaybackState,
    pub outcome: Outcome,
    pub engine_error: Option<String>,
    pub elapsed_ms: u64,
}

impl SessionReport {
    pub fn new(session_id: SessionId, config: &PlaybackConfig, final_state: PlaybackState) -> Self {
        Self {
            session_id,
            source: config.source_uri.clone(),
            is_live: config.is_live,
            scale_mode: config.scale_mode,
            fullscreen: config.starts_fullscreen(),
            final_state,
            outcome: Outcome::Finished,
            engine_error: None,
            elapsed_ms: 0,
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session {}", self.session_id)?;
        writeln!(f, "  Source:      {}", self.source)?;
        writeln!(f, "  Live:        {}", self.is_live)?;
        writeln!(f, "  Scale mode:  {}", self.scale_mode)?;
        writeln!(f, "  Fullscreen:  {}", self.fullscreen)?;
        writeln!(f, "  Final state: {}", self.final_state)?;
        writeln!(f, "  Outcome:     {:?}", self.outcome)?;
        if let Some(err) = &self.engine_error {
            writeln!(f, "  Error:       {}", err)?;
        }
        write!(f, "  Elapsed:     {} ms", self.elapsed_ms)
    }
}

/// Format output based on selected format
pub fn format_output<T: Serialize + fmt::Display>(data: &T, format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Text => data.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SessionReport {
        let config = PlaybackConfig::new("http://example/stream.m3u8")
            .live(true)
            .fullscreen_only(true);
        SessionReport::new(SessionId::new(), &config, PlaybackState::Complete)
    }

    #[test]
    fn test_format_selection() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Text);
    }

    #[test]
    fn test_json_report() {
        let json = format_output(&report(), "json");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["final_state"], "complete");
        assert_eq!(value["scale_mode"], "fit_parent");
        assert_eq!(value["outcome"], "finished");
        assert_eq!(value["fullscreen"], true);
    }

    #[test]
    fn test_text_report() {
        let text = format_output(&report(), "text");
        assert!(text.contains("Final state: complete"));
        assert!(text.contains("http://example/stream.m3u8"));
        assert!(!text.contains("Error:"));
    }
}
