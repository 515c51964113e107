//! Playlist files
//!
//! The engine never fetches catalog data; the CLI stands in for the catalog
//! provider by reading a JSON file, either a bare array of tracks or an
//! object with an optional `source` tag:
//!
//! ```json
//! { "source": "album:7", "tracks": [{ "id": "1", "url": "https://...", "name": "Intro" }] }
//! ```

use crate::error::{CliError, Result};
use cadence_core::{PlaylistSnapshot, Track};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum PlaylistFile {
    Tracks(Vec<Track>),
    Tagged {
        #[serde(default)]
        source: Option<String>,
        tracks: Vec<Track>,
    },
}

/// Parse a playlist document
pub fn parse_playlist(raw: &str) -> Result<PlaylistSnapshot> {
    let file: PlaylistFile =
        serde_json::from_str(raw).map_err(|e| CliError::Playlist(e.to_string()))?;

    let snapshot = match file {
        PlaylistFile::Tracks(tracks) => PlaylistSnapshot::new(None, tracks),
        PlaylistFile::Tagged { source, tracks } => PlaylistSnapshot::new(source, tracks),
    };

    if snapshot.is_empty() {
        return Err(CliError::Playlist("playlist has no tracks".to_string()));
    }
    Ok(snapshot)
}

/// Read and parse a playlist file
pub async fn load_playlist(path: &Path) -> Result<PlaylistSnapshot> {
    let raw = tokio::fs::read_to_string(path).await?;
    parse_playlist(&raw)
}

/// Built-in playlist used when none is given
pub fn demo_playlist() -> PlaylistSnapshot {
    let tracks = [
        ("demo-1", "Morning Static"),
        ("demo-2", "Low Orbit"),
        ("demo-3", "Paper Lanterns"),
        ("demo-4", "Night Ferry"),
    ]
    .into_iter()
    .map(|(id, name)| {
        Track::new(id, format!("https://cdn.cadence.local/{id}.mp3"), name)
            .with_artist("Cadence Demo Band")
    })
    .collect();

    PlaylistSnapshot::new(Some("demo".to_string()), tracks)
}
