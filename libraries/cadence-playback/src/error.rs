//! Error types for playback management

use cadence_core::TrackId;
use thiserror::Error;

/// Failures reported by a [`PlaybackResource`](crate::PlaybackResource).
///
/// `AutoplayBlocked` and `Interrupted` are the two outcomes of a play request
/// that the controller treats specially; everything else is surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The platform refused to start playback without a user gesture
    #[error("Autoplay blocked until the user interacts")]
    AutoplayBlocked,

    /// The play request was superseded by a pause or a new source
    #[error("Play request interrupted")]
    Interrupted,

    /// The media could not be loaded
    #[error("Media load failed: {0}")]
    LoadFailed(String),

    /// Any other playback failure
    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// A play-all style command received an empty playlist
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Track has no usable stream URL
    #[error("Track {0} has no stream URL")]
    MissingStreamUrl(TrackId),

    /// Track is not part of the playlist it was selected from
    #[error("Track {0} is not in the playlist")]
    TrackNotInPlaylist(TrackId),

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// The playback resource is already owned by another controller
    #[error("Playback resource is already in use")]
    ResourceBusy,

    /// Player service has shut down
    #[error("Player service is not running")]
    ServiceClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
