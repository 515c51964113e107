//! Cadence - Playback Engine
//!
//! Platform-agnostic playback engine for Cadence.
//!
//! This crate provides:
//! - A playback controller driving one shared media resource
//! - Four play modes (Sequential, Single repeat, Loop, Shuffle)
//! - Fisher-Yates shuffle orders over playlist snapshots
//! - Autoplay handling (blocked plays, one retry for interrupted plays)
//! - Progress, buffering and drag-to-seek
//! - Volume control (0-100, mute/unmute)
//! - Session persistence through a key/value store
//!
//! # Architecture
//!
//! `cadence-playback` does not know about any concrete media backend or
//! database. The media output is a [`PlaybackResource`], storage is a
//! [`SessionStore`](cadence_core::SessionStore) and telemetry is a
//! [`PlayStatReporter`](cadence_core::PlayStatReporter).
//!
//! Asynchronous work (loads, plays, timers, telemetry) runs on spawned tasks
//! that report back to the controller. Every play request carries a
//! generation, so a pause always wins over a play that settles later.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use cadence_core::{traits::NoopReporter, PlaylistSnapshot, Track};
//! use cadence_playback::{
//!     PlaybackConfig, PlaybackController, PlaybackState, SharedResource, SimulatedConfig,
//!     SimulatedResource,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cadence_playback::Result<()> {
//! let resource = SharedResource::new(SimulatedResource::new(SimulatedConfig::default()));
//! let mut controller =
//!     PlaybackController::new(&resource, Arc::new(NoopReporter), PlaybackConfig::default())?;
//!
//! let playlist = PlaylistSnapshot::new(
//!     None,
//!     vec![
//!         Track::new("t1", "https://cdn.example.com/t1.mp3", "First"),
//!         Track::new("t2", "https://cdn.example.com/t2.mp3", "Second"),
//!     ],
//! );
//!
//! controller.play_all(playlist, 0)?;
//! controller.settle().await;
//! assert_eq!(controller.state(), PlaybackState::Playing);
//!
//! controller.set_volume(80);
//! controller.pause();
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Running as a Service
//!
//! ```rust,no_run
//! use cadence_core::traits::NoopReporter;
//! use cadence_playback::{
//!     PlaybackConfig, PlaybackController, PlayerService, SharedResource, SimulatedConfig,
//!     SimulatedResource,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> cadence_playback::Result<()> {
//! let resource = SharedResource::new(SimulatedResource::new(SimulatedConfig::default()));
//! let controller =
//!     PlaybackController::new(&resource, Arc::new(NoopReporter), PlaybackConfig::default())?;
//!
//! let (player, task) = PlayerService::spawn(controller);
//! let mut events = player.subscribe();
//! player.toggle_mode()?;
//! let _event = events.recv().await;
//!
//! player.shutdown()?;
//! let _controller = task.await;
//! # Ok(())
//! # }
//! ```

mod controller;
mod error;
mod events;
mod mode;
mod persistence;
mod progress;
mod resource;
mod service;
mod session;
mod shuffle;
mod simulated;
pub mod types;
mod volume;

// Public exports
pub use controller::{PlaybackController, Signal};
pub use error::{PlaybackError, ResourceError, Result};
pub use events::{PlaybackEvent, SessionObserver, SessionObservers};
pub use mode::{Direction, ModeSelector, Step};
pub use persistence::{PersistedSession, PersistenceBridge, PersistenceObserver};
pub use progress::{
    format_time, DragState, DragUpdate, NoopCapture, PointerCapture, ProgressBar,
    ProgressTracker,
};
pub use resource::{MediaEvent, PlaybackResource, ResourceLease, SharedResource};
pub use service::{PlaybackCommand, PlayerHandle, PlayerService};
pub use session::PlaybackSession;
pub use shuffle::{shuffle, shuffle_with, ShuffleOrder};
pub use simulated::{SimulatedConfig, SimulatedResource};
pub use types::{PlaybackConfig, PlaybackState, DEFAULT_SESSION_KEY};
pub use volume::{Volume, VolumeChange};
