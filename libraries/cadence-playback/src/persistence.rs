//! Session persistence
//!
//! Restores the session before the controller accepts commands and writes it
//! back whenever a persisted field changes. Writes go through a latest-value
//! channel to a single writer task, so bursts of time updates collapse into
//! one write. Storage failures are logged and never reach the caller.

use crate::events::{PlaybackEvent, SessionObserver};
use crate::session::PlaybackSession;
use crate::types::PlaybackConfig;
use crate::volume::Volume;
use cadence_core::{PlayMode, PlaylistSnapshot, SessionStore, Track};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The durable session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedSession {
    /// Source tag of the playlist being navigated
    pub playlist: Option<String>,
    pub current_playlist: Vec<Track>,
    pub current_music: Option<Track>,
    pub current_index: usize,
    pub current_time: f64,
    pub is_playing: bool,
    pub play_mode: PlayMode,
    pub progress_percent: f64,
    pub buffer_percent: f64,
    pub duration: f64,
    /// Always written as false; drags never survive a restart
    pub is_dragging: bool,
    pub volume: u8,
    pub is_muted: bool,
    pub user_interacted: bool,
}

impl Default for PersistedSession {
    fn default() -> Self {
        Self::capture(&PlaybackSession::default())
    }
}

impl PersistedSession {
    /// Snapshot the persisted fields of a session
    pub fn capture(session: &PlaybackSession) -> Self {
        Self {
            playlist: session.playlist.source.clone(),
            current_playlist: session.playlist.tracks.clone(),
            current_music: session.current_track.clone(),
            current_index: session.current_index,
            current_time: session.current_time,
            is_playing: session.is_playing,
            play_mode: session.play_mode,
            progress_percent: session.progress_percent,
            buffer_percent: session.buffer_percent,
            duration: session.duration,
            is_dragging: false,
            volume: session.volume.level(),
            is_muted: session.is_muted(),
            user_interacted: session.user_interacted,
        }
    }

    /// Rebuild a session, repairing out-of-range values
    pub fn into_session(self) -> PlaybackSession {
        let playlist = PlaylistSnapshot::new(self.playlist, self.current_playlist);
        // A current track needs a sequence to sit in
        let (current_track, current_index) = if playlist.is_empty() {
            (None, 0)
        } else {
            (self.current_music, self.current_index.min(playlist.len() - 1))
        };

        PlaybackSession {
            playlist,
            current_track,
            current_index,
            current_time: finite_or_zero(self.current_time),
            duration: finite_or_zero(self.duration),
            is_playing: self.is_playing,
            play_mode: self.play_mode,
            volume: Volume::new(self.volume, self.is_muted),
            user_interacted: self.user_interacted,
            first_load_completed: false,
            progress_percent: finite_or_zero(self.progress_percent).min(100.0),
            buffer_percent: finite_or_zero(self.buffer_percent).min(100.0),
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Reads and writes the session record in a [`SessionStore`]
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn SessionStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the saved session, falling back to defaults on any failure
    pub async fn restore(&self, config: &PlaybackConfig) -> PlaybackSession {
        let raw = match self.store.load(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No saved session");
                return PlaybackSession::new(config);
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "Failed to read saved session");
                return PlaybackSession::new(config);
            }
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(record) => {
                info!(
                    key = %self.key,
                    tracks = record.current_playlist.len(),
                    current_time = record.current_time,
                    "Restored playback session"
                );
                record.into_session()
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "Saved session is unreadable, starting fresh");
                PlaybackSession::new(config)
            }
        }
    }

    /// Write the session now
    pub async fn save(&self, session: &PlaybackSession) {
        write_record(self.store.as_ref(), &self.key, &PersistedSession::capture(session)).await;
    }

    /// Remove the saved session
    pub async fn clear(&self) {
        if let Err(err) = self.store.remove(&self.key).await {
            warn!(key = %self.key, error = %err, "Failed to clear saved session");
        }
    }

    /// Start the writer task and return the observer that feeds it
    ///
    /// The task exits once the observer (and every clone) is dropped, after
    /// writing the last record it was handed.
    pub fn attach(&self) -> (Arc<PersistenceObserver>, JoinHandle<()>) {
        let (tx, mut rx) = watch::channel::<Option<PersistedSession>>(None);
        let store = self.store.clone();
        let key = self.key.clone();

        let writer = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let record = rx.borrow_and_update().clone();
                if let Some(record) = record {
                    write_record(store.as_ref(), &key, &record).await;
                }
            }
            debug!(key = %key, "Session writer stopped");
        });

        let observer = Arc::new(PersistenceObserver {
            tx,
            last: Mutex::new(None),
        });
        (observer, writer)
    }
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

async fn write_record(store: &dyn SessionStore, key: &str, record: &PersistedSession) {
    let raw = match serde_json::to_string(record) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(key, error = %err, "Failed to encode session");
            return;
        }
    };
    if let Err(err) = store.save(key, &raw).await {
        warn!(key, error = %err, "Failed to save session");
    }
}

/// Observer that forwards changed session records to the writer task
pub struct PersistenceObserver {
    tx: watch::Sender<Option<PersistedSession>>,
    last: Mutex<Option<PersistedSession>>,
}

impl SessionObserver for PersistenceObserver {
    fn on_event(&self, _event: &PlaybackEvent, session: &PlaybackSession) {
        let record = PersistedSession::capture(session);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&record) {
            return;
        }
        *last = Some(record.clone());
        self.tx.send_replace(Some(record));
    }
}

impl std::fmt::Debug for PersistenceObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceObserver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_tracks() -> PlaybackSession {
        let tracks = vec![
            Track::new("a", "https://cdn.example/a.mp3", "A"),
            Track::new("b", "https://cdn.example/b.mp3", "B"),
        ];
        let mut session = PlaybackSession::default();
        session.playlist = PlaylistSnapshot::new(Some("album:1".to_string()), tracks.clone());
        session.current_track = Some(tracks[1].clone());
        session.current_index = 1;
        session.current_time = 42.5;
        session.duration = 200.0;
        session.user_interacted = true;
        session
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let record = PersistedSession::capture(&session_with_tracks());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["currentIndex"], 1);
        assert_eq!(json["currentTime"], 42.5);
        assert_eq!(json["playMode"], "sequential");
        assert_eq!(json["isDragging"], false);
        assert_eq!(json["currentMusic"]["id"], "b");
        assert_eq!(json["playlist"], "album:1");
    }

    #[test]
    fn restore_keeps_position_and_drops_transient_flags() {
        let mut session = session_with_tracks();
        session.first_load_completed = true;

        let restored = PersistedSession::capture(&session).into_session();

        assert_eq!(restored.current_time, 42.5);
        assert_eq!(restored.current_index, 1);
        assert!(restored.user_interacted);
        assert!(!restored.first_load_completed);
    }

    #[test]
    fn restore_repairs_bad_values() {
        let record = PersistedSession {
            current_index: 9,
            current_time: -3.0,
            volume: 250,
            current_playlist: vec![Track::new("a", "u", "A")],
            ..PersistedSession::default()
        };
        let session = record.into_session();

        assert_eq!(session.current_index, 0);
        assert_eq!(session.current_time, 0.0);
        assert_eq!(session.volume.level(), 100);
    }

    #[test]
    fn track_without_playlist_is_dropped() {
        let record = PersistedSession {
            current_music: Some(Track::new("a", "https://cdn.example/a.mp3", "A")),
            current_index: 3,
            current_time: 20.0,
            ..PersistedSession::default()
        };
        let session = record.into_session();

        assert!(session.current_track.is_none());
        assert!(session.playlist.is_empty());
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn partial_record_fills_defaults() {
        let record: PersistedSession =
            serde_json::from_str(r#"{"currentTime": 12.0, "playMode": "loop"}"#).unwrap();
        assert_eq!(record.current_time, 12.0);
        assert_eq!(record.play_mode, PlayMode::Loop);
        assert_eq!(record.volume, 70);
    }
}
