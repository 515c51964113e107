/// Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Playable track as supplied by the catalog provider
///
/// Immutable once obtained. Only `id`, `url` and `name` matter to the
/// engine; the remaining fields ride along for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog identifier
    pub id: TrackId,

    /// Stream URL (may be empty when the catalog has no playable source)
    pub url: String,

    /// Display name
    pub name: String,

    /// Artist name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    /// Cover art URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: impl Into<TrackId>, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            name: name.into(),
            artist: None,
            cover_url: None,
        }
    }

    /// Set the artist name
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Whether the track has a stream URL to load
    pub fn has_stream(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_without_url_has_no_stream() {
        assert!(!Track::new("1", "", "Silent").has_stream());
        assert!(!Track::new("1", "   ", "Silent").has_stream());
        assert!(Track::new("1", "https://cdn/1.mp3", "Loud").has_stream());
    }

    #[test]
    fn optional_fields_are_skipped_when_empty() {
        let json = serde_json::to_value(Track::new("1", "u", "n")).unwrap();
        assert!(json.get("artist").is_none());

        let json = serde_json::to_value(Track::new("1", "u", "n").with_artist("A")).unwrap();
        assert_eq!(json["artist"], "A");
    }
}
