/// CLI configuration
use crate::error::{CliError, Result};
use cadence_playback::{PlaybackConfig, SimulatedConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Milliseconds between simulated time updates
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Seconds reported for tracks without a known length
    #[serde(default = "default_track_seconds")]
    pub default_track_seconds: f64,

    /// Refuse playback until the first `play` command
    #[serde(default)]
    pub block_autoplay: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            default_track_seconds: default_track_seconds(),
            block_autoplay: false,
        }
    }
}

impl SimulationSettings {
    pub fn to_simulated(&self) -> SimulatedConfig {
        SimulatedConfig {
            tick: Duration::from_millis(self.tick_ms),
            default_duration: self.default_track_seconds,
            block_autoplay: self.block_autoplay,
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `cadence.toml` in the working directory and is
    /// skipped when missing. `CADENCE_*` variables override the file, with
    /// `__` separating sections (`CADENCE_PLAYBACK__VOLUME=40`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from("cadence.toml"), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if path.is_some() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.volume > 100 {
            return Err(CliError::Config(format!(
                "Volume must be between 0 and 100, got {}",
                self.playback.volume
            )));
        }

        if self.playback.session_key.trim().is_empty() {
            return Err(CliError::Config("Session key must not be empty".to_string()));
        }

        if self.simulation.tick_ms == 0 {
            return Err(CliError::Config("Simulation tick must be positive".to_string()));
        }

        if !self.simulation.default_track_seconds.is_finite()
            || self.simulation.default_track_seconds <= 0.0
        {
            return Err(CliError::Config(
                "Default track length must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite://cadence.db".to_string()
}

fn default_tick_ms() -> u64 {
    250
}

fn default_track_seconds() -> f64 {
    180.0
}
