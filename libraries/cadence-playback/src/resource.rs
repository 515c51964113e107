//! Platform-agnostic playback resource
//!
//! Abstracts the single media output (a browser audio element, a desktop
//! stream, the simulated clock) behind an async trait. The controller is the
//! only component that drives it; [`SharedResource`] enforces that.

use crate::error::{PlaybackError, ResourceError, Result};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Signals raised by the resource while it plays
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Duration became known (seconds)
    MetadataReady { duration: f64 },

    /// Playback position advanced (seconds)
    TimeUpdated { current_time: f64 },

    /// End of the buffered range moved (seconds)
    BufferUpdated { buffered_end: f64 },

    /// Playback reached the end of the media
    Ended,
}

/// The single media output
///
/// `load` and `play` settle asynchronously; the other operations apply
/// immediately. A `play` may settle with [`ResourceError::Interrupted`] if a
/// `pause` or new `load` supersedes it.
#[async_trait]
pub trait PlaybackResource: Send + Sync {
    /// URL of the currently loaded media, if any
    fn source(&self) -> Option<String>;

    /// Load media and wait for its metadata, returning the duration in seconds
    async fn load(&self, url: &str) -> std::result::Result<f64, ResourceError>;

    /// Start or resume playback
    async fn play(&self) -> std::result::Result<(), ResourceError>;

    fn pause(&self);

    /// Jump to a position in seconds
    fn seek(&self, seconds: f64);

    /// Output level (0-100)
    fn set_volume(&self, level: u8);

    fn set_muted(&self, muted: bool);

    /// Subscribe to media events
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;
}

/// A resource that can be leased by at most one controller at a time
#[derive(Clone)]
pub struct SharedResource {
    resource: Arc<dyn PlaybackResource>,
    leased: Arc<AtomicBool>,
}

impl SharedResource {
    pub fn new(resource: impl PlaybackResource + 'static) -> Self {
        Self::from_arc(Arc::new(resource))
    }

    pub fn from_arc(resource: Arc<dyn PlaybackResource>) -> Self {
        Self {
            resource,
            leased: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take exclusive control of the resource
    ///
    /// Fails with [`PlaybackError::ResourceBusy`] while another lease is alive.
    pub fn lease(&self) -> Result<ResourceLease> {
        self.leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PlaybackError::ResourceBusy)?;

        Ok(ResourceLease {
            resource: self.resource.clone(),
            leased: self.leased.clone(),
        })
    }

    pub fn is_leased(&self) -> bool {
        self.leased.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SharedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedResource")
            .field("leased", &self.is_leased())
            .finish_non_exhaustive()
    }
}

/// Exclusive handle to a shared resource, released on drop
pub struct ResourceLease {
    resource: Arc<dyn PlaybackResource>,
    leased: Arc<AtomicBool>,
}

impl ResourceLease {
    /// Clone of the underlying resource for use inside spawned tasks
    pub fn handle(&self) -> Arc<dyn PlaybackResource> {
        self.resource.clone()
    }
}

impl Deref for ResourceLease {
    type Target = dyn PlaybackResource;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref()
    }
}

impl Drop for ResourceLease {
    fn drop(&mut self) {
        self.leased.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for ResourceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLease").finish_non_exhaustive()
    }
}
