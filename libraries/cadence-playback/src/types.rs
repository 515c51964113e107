//! Core types for playback management

use cadence_core::PlayMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default storage key for the persisted session record
pub const DEFAULT_SESSION_KEY: &str = "playback-session";

/// Playback state as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track selected
    #[default]
    Idle,

    /// Resource is loading the current track
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track (or loaded and waiting)
    Paused,

    /// Current track reached its end
    Ended,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 70)
    pub volume: u8,

    /// Initial play mode (default: Sequential)
    pub play_mode: PlayMode,

    /// Delay between a skip and the automatic play attempt (default: 100ms)
    pub advance_delay_ms: u64,

    /// Delay before retrying an interrupted play request (default: 100ms)
    pub retry_delay_ms: u64,

    /// Storage key of the persisted session
    pub session_key: String,
}

impl PlaybackConfig {
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 70,
            play_mode: PlayMode::Sequential,
            advance_delay_ms: 100,
            retry_delay_ms: 100,
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.volume, 70);
        assert_eq!(config.play_mode, PlayMode::Sequential);
        assert_eq!(config.advance_delay(), Duration::from_millis(100));
        assert_eq!(config.retry_delay(), Duration::from_millis(100));
        assert_eq!(config.session_key, "playback-session");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlaybackConfig = serde_json::from_str(r#"{"volume": 40}"#).unwrap();
        assert_eq!(config.volume, 40);
        assert_eq!(config.advance_delay_ms, 100);
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
    }
}
