//! Domain types for Cadence

mod identity;
mod ids;
mod play_mode;
mod playlist;
mod track;

pub use identity::{PlayStat, SessionIdentity};
pub use ids::TrackId;
pub use play_mode::PlayMode;
pub use playlist::PlaylistSnapshot;
pub use track::Track;
