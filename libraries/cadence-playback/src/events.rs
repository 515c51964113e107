//! Playback Events
//!
//! Event-based communication for UI synchronization during playback.
//! Events are emitted at key points:
//! - State, track and mode changes
//! - Position, buffer and drag updates
//! - Volume and mute changes (volume always first)
//! - User-visible errors and notices

use crate::session::PlaybackSession;
use crate::types::PlaybackState;
use cadence_core::{PlayMode, TrackId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// Current track changed (or was cleared)
    TrackChanged {
        track_id: Option<TrackId>,
        previous_track_id: Option<TrackId>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished { track_id: TrackId },

    /// Position update from the resource, a seek, or the end of a drag
    PositionUpdate {
        /// Seconds
        current_time: f64,
        /// Seconds
        duration: f64,
        /// 0-100
        progress_percent: f64,
    },

    /// Buffered range update
    BufferUpdate { buffer_percent: f64 },

    /// Duration became known
    DurationChanged { duration: f64 },

    /// Drag moved the displayed progress
    DragUpdated { percent: f64 },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0-100)
        level: u8,
    },

    /// Mute toggled
    MuteChanged { is_muted: bool },

    /// Play mode changed
    ModeChanged { mode: PlayMode },

    /// Playlist snapshot replaced or cleared
    PlaylistChanged {
        /// New playlist length
        length: usize,
    },

    /// User interaction was recorded for the first time
    UserInteracted,

    /// User-visible error
    Error {
        /// Error message
        message: String,
    },

    /// User-visible informational message
    Notice { message: String },
}

/// Receives every event together with the session state after the change
///
/// Observers run synchronously on the controller, in subscription order.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &PlaybackEvent, session: &PlaybackSession);
}

/// Ordered observer list
#[derive(Default)]
pub struct SessionObservers {
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl SessionObservers {
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn notify(&self, event: &PlaybackEvent, session: &PlaybackSession) {
        for observer in &self.observers {
            observer.on_event(event, session);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for SessionObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionObservers")
            .field("count", &self.observers.len())
            .finish()
    }
}
