//! Cadence Core
//!
//! Platform-agnostic domain types, collaborator traits, and error handling
//! shared by the Cadence playback engine and its applications.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `PlaylistSnapshot`, `PlayMode`, `SessionIdentity`
//! - **Collaborator Traits**: `PlayStatReporter` (telemetry), `SessionStore` (durable key/value)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! The engine never fetches catalog data itself: tracks and playlists arrive
//! from a catalog provider as immutable values.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::types::{PlaylistSnapshot, Track, PlayMode};
//!
//! let playlist = PlaylistSnapshot::new(
//!     Some("daily-mix".to_string()),
//!     vec![
//!         Track::new("t1", "https://cdn.example.com/t1.mp3", "First"),
//!         Track::new("t2", "https://cdn.example.com/t2.mp3", "Second"),
//!     ],
//! );
//!
//! assert_eq!(playlist.len(), 2);
//! assert_eq!(PlayMode::Sequential.next(), PlayMode::Single);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use storage::SessionStore;
pub use traits::PlayStatReporter;

pub use types::{PlayMode, PlayStat, PlaylistSnapshot, SessionIdentity, Track, TrackId};
