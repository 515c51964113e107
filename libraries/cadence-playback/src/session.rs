//! Playback session
//!
//! The single authoritative record of what is playing. Only the controller
//! mutates it; everyone else reads it through events or `session()`.

use crate::types::PlaybackConfig;
use crate::volume::Volume;
use cadence_core::{PlayMode, PlaylistSnapshot, Track};

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    /// Last playlist handed to a play command
    pub playlist: PlaylistSnapshot,

    pub current_track: Option<Track>,

    /// Index into the active sequence (shuffle order in random mode)
    pub current_index: usize,

    /// Seconds
    pub current_time: f64,

    /// Seconds, 0 until metadata is known
    pub duration: f64,

    pub is_playing: bool,

    pub play_mode: PlayMode,

    pub volume: Volume,

    /// Set by the first user-initiated command, never cleared
    pub user_interacted: bool,

    /// Set once a user-triggered play has been attempted; not persisted
    pub first_load_completed: bool,

    /// 0-100
    pub progress_percent: f64,

    /// 0-100
    pub buffer_percent: f64,
}

impl PlaybackSession {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            playlist: PlaylistSnapshot::default(),
            current_track: None,
            current_index: 0,
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            play_mode: config.play_mode,
            volume: Volume::new(config.volume, false),
            user_interacted: false,
            first_load_completed: false,
            progress_percent: 0.0,
            buffer_percent: 0.0,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn current_track_id(&self) -> Option<&cadence_core::TrackId> {
        self.current_track.as_ref().map(|t| &t.id)
    }

    /// Reset position and progress fields for a new track
    pub(crate) fn reset_position(&mut self) {
        self.current_time = 0.0;
        self.progress_percent = 0.0;
        self.buffer_percent = 0.0;
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}
