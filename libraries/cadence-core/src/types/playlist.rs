/// Playlist snapshot domain type
use crate::types::{Track, TrackId};
use serde::{Deserialize, Serialize};

/// Ordered sequence of tracks plus the collection it came from
///
/// Treated as immutable for a playback session: replacing the snapshot
/// resets navigation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    /// Opaque tag naming the originating collection
    #[serde(default)]
    pub source: Option<String>,

    /// Tracks in playback order
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl PlaylistSnapshot {
    /// Create a snapshot
    pub fn new(source: Option<String>, tracks: Vec<Track>) -> Self {
        Self { source, tracks }
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the snapshot has no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Position of the first track with the given identifier
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_matches_by_identifier() {
        let playlist = PlaylistSnapshot::new(
            None,
            vec![
                Track::new("a", "u/a", "A"),
                Track::new("b", "u/b", "B"),
                Track::new("c", "u/c", "C"),
            ],
        );

        assert_eq!(playlist.position_of(&TrackId::new("c")), Some(2));
        assert_eq!(playlist.position_of(&TrackId::new("z")), None);
    }

    #[test]
    fn missing_fields_deserialize_to_empty() {
        let playlist: PlaylistSnapshot = serde_json::from_str("{}").unwrap();
        assert!(playlist.is_empty());
        assert!(playlist.source.is_none());
    }
}
